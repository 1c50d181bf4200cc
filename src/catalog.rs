//! Catalog loading and validation.
//!
//! The catalog is read once from a comma-separated file and is immutable
//! afterwards. Required columns are `song`, `artist`, `emotion` and
//! `popularity`, matched case-insensitively; other columns are ignored.
//!
//! Only a missing source, a missing required column, or a required column
//! given twice fail the load. Individual bad rows are skipped and counted in
//! `CatalogStats`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{CatalogEntry, CatalogStats, EmotionLabel};
use crate::progress::{create_spinner, log_progress};

pub const REQUIRED_COLUMNS: [&str; 4] = ["song", "artist", "emotion", "popularity"];

/// Rows between log-only progress lines while loading.
const LOG_INTERVAL: u64 = 50_000;

/// The catalog-unavailable condition. Raised once, at load time.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog unavailable: cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog unavailable: missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("catalog unavailable: column(s) given more than once: {}", .0.join(", "))]
    AmbiguousColumns(Vec<String>),

    #[error("catalog unavailable: malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw CSV row. Every field is optional so one bad cell skips a row
/// instead of failing the load.
#[derive(Debug, Deserialize)]
struct RawRow {
    song: Option<String>,
    artist: Option<String>,
    emotion: Option<String>,
    popularity: Option<String>,
}

/// Immutable, loaded song catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    stats: CatalogStats,
}

impl Catalog {
    /// Open and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let spinner = create_spinner("Loading catalog");
        let catalog = Self::from_reader(file)?;
        spinner.finish_with_message(format!(
            "Loaded {} songs ({} rows skipped)",
            catalog.len(),
            catalog.stats.total_skipped()
        ));
        Ok(catalog)
    }

    /// Parse a catalog from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // Lower-case the header so "Popularity" matches `popularity`.
        let headers: csv::StringRecord = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !headers.iter().any(|h| h == **c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::MissingColumns(missing));
        }
        let repeated: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| headers.iter().filter(|h| h == *c).count() > 1)
            .map(|c| c.to_string())
            .collect();
        if !repeated.is_empty() {
            return Err(CatalogError::AmbiguousColumns(repeated));
        }

        let mut stats = CatalogStats::default();
        let mut entries = Vec::new();
        let mut seen: FxHashSet<(String, String)> = FxHashSet::default();

        for record in csv_reader.records() {
            let record = record?;
            stats.rows_read += 1;
            log_progress("catalog", stats.rows_read as u64, 0, LOG_INTERVAL);

            let row: RawRow = match record.deserialize(Some(&headers)) {
                Ok(row) => row,
                Err(_) => {
                    stats.skipped_malformed += 1;
                    continue;
                }
            };

            let emotion = match row.emotion.as_deref().map(str::parse::<EmotionLabel>) {
                Some(Ok(label)) if !label.is_unknown() => label,
                _ => {
                    stats.skipped_unlisted_emotion += 1;
                    continue;
                }
            };

            let popularity = match row.popularity.as_deref().map(str::parse::<f64>) {
                Some(Ok(p)) if p.is_finite() => p,
                _ => {
                    stats.skipped_bad_popularity += 1;
                    continue;
                }
            };

            let song = row.song.unwrap_or_default();
            let artist = row.artist.unwrap_or_default();

            // One emotion tag per (song, artist): keep the first occurrence.
            if !seen.insert((song.to_lowercase(), artist.to_lowercase())) {
                stats.skipped_duplicates += 1;
                continue;
            }

            *stats.per_emotion.entry(emotion).or_insert(0) += 1;
            entries.push(CatalogEntry {
                song,
                artist,
                emotion,
                popularity,
            });
        }

        stats.rows_loaded = entries.len();
        Ok(Self { entries, stats })
    }

    /// Build a catalog from entries already in memory.
    /// Entries tagged `unknown` are dropped; nothing else is validated.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let rows_read = entries.len();
        let entries: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|e| !e.emotion.is_unknown())
            .collect();
        let mut per_emotion = FxHashMap::default();
        for e in &entries {
            *per_emotion.entry(e.emotion).or_insert(0) += 1;
        }
        let stats = CatalogStats {
            rows_read,
            rows_loaded: entries.len(),
            skipped_unlisted_emotion: rows_read - entries.len(),
            per_emotion,
            ..Default::default()
        };
        Self { entries, stats }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries tagged with `label`.
    pub fn pool_size(&self, label: EmotionLabel) -> usize {
        self.stats.per_emotion.get(&label).copied().unwrap_or(0)
    }
}
