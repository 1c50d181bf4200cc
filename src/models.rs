//! Core data models for emotion-based recommendation.
//!
//! This module contains the emotion label set, catalog rows, and the
//! statistics structs shared by the loader, the engine, and the CLI.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Emotion Labels
// ============================================================================

/// Closed set of emotions the classifier can produce.
/// `Unknown` is classifier output only; catalog rows are never tagged with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Sadness,
    Joy,
    Anger,
    Calm,
    Excited,
    Unknown,
}

impl EmotionLabel {
    /// Taggable labels in category order.
    /// First-match priority and frequency tie-breaking both follow this order.
    pub const CATEGORIES: [EmotionLabel; 5] = [
        EmotionLabel::Sadness,
        EmotionLabel::Joy,
        EmotionLabel::Anger,
        EmotionLabel::Calm,
        EmotionLabel::Excited,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Joy => "joy",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Calm => "calm",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Unknown => "unknown",
        }
    }

    pub fn is_unknown(self) -> bool {
        self == EmotionLabel::Unknown
    }

    /// Position in `CATEGORIES`, or None for `Unknown`.
    pub fn category_index(self) -> Option<usize> {
        Self::CATEGORIES.iter().position(|&c| c == self)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a string is not one of the label names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized emotion label '{0}'")]
pub struct UnrecognizedLabel(pub String);

impl FromStr for EmotionLabel {
    type Err = UnrecognizedLabel;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sadness" => Ok(EmotionLabel::Sadness),
            "joy" => Ok(EmotionLabel::Joy),
            "anger" => Ok(EmotionLabel::Anger),
            "calm" => Ok(EmotionLabel::Calm),
            "excited" => Ok(EmotionLabel::Excited),
            "unknown" => Ok(EmotionLabel::Unknown),
            _ => Err(UnrecognizedLabel(s.to_string())),
        }
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// One row of the static song dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub song: String,
    pub artist: String,
    pub emotion: EmotionLabel, // never Unknown
    pub popularity: f64,       // finite, ordering only
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Load-time statistics for the catalog.
#[derive(Default, Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub rows_read: usize,
    pub rows_loaded: usize,

    // Skipped rows
    pub skipped_malformed: usize,        // Row could not be decoded
    pub skipped_unlisted_emotion: usize, // Tag outside the five taggable labels
    pub skipped_bad_popularity: usize,   // Missing, unparsable, or non-finite
    pub skipped_duplicates: usize,       // Same (song, artist) seen earlier

    pub per_emotion: FxHashMap<EmotionLabel, usize>,
}

impl CatalogStats {
    pub fn total_skipped(&self) -> usize {
        self.skipped_malformed
            + self.skipped_unlisted_emotion
            + self.skipped_bad_popularity
            + self.skipped_duplicates
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }
}

/// Outcome counts for a batch of queries.
#[derive(Default, Debug, Clone, Serialize)]
pub struct BatchStats {
    pub queries: usize,
    pub blank: usize,
    pub unrecognized: usize,
    pub no_matches: usize,
    pub playlists: usize,
    pub per_label: FxHashMap<EmotionLabel, usize>,
    pub elapsed_seconds: f64,
}

impl BatchStats {
    /// Share of non-blank queries that produced a label, as a percentage
    pub fn recognition_rate(&self) -> f64 {
        let asked = self.queries - self.blank;
        if asked == 0 {
            0.0
        } else {
            100.0 * (asked - self.unrecognized) as f64 / asked as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_case_insensitive() {
        assert_eq!("Joy".parse::<EmotionLabel>(), Ok(EmotionLabel::Joy));
        assert_eq!(" SADNESS ".parse::<EmotionLabel>(), Ok(EmotionLabel::Sadness));
        let err = "love".parse::<EmotionLabel>().unwrap_err();
        assert_eq!(err, UnrecognizedLabel("love".to_string()));
        assert_eq!(err.to_string(), "unrecognized emotion label 'love'");
    }

    #[test]
    fn test_label_roundtrips_display() {
        for label in EmotionLabel::CATEGORIES {
            assert_eq!(label.to_string().parse::<EmotionLabel>(), Ok(label));
        }
    }

    #[test]
    fn test_categories_exclude_unknown() {
        assert!(!EmotionLabel::CATEGORIES.contains(&EmotionLabel::Unknown));
        assert_eq!(EmotionLabel::Unknown.category_index(), None);
        assert_eq!(EmotionLabel::Sadness.category_index(), Some(0));
        assert_eq!(EmotionLabel::Excited.category_index(), Some(4));
    }

    #[test]
    fn test_recognition_rate() {
        let stats = BatchStats {
            queries: 5,
            blank: 1,
            unrecognized: 1,
            ..Default::default()
        };
        assert!((stats.recognition_rate() - 75.0).abs() < 1e-9);
        assert_eq!(BatchStats::default().recognition_rate(), 0.0);
    }
}
