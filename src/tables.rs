//! Static configuration tables: keyword sets and the similarity map.
//!
//! Both tables are fixed at start-up. Defaults are built in; a JSON tables
//! file may replace either one. Entries are always held in category order
//! (see `EmotionLabel::CATEGORIES`), whatever order the source used.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::EmotionLabel;
use crate::normalize::normalize_text;

// ============================================================================
// DEFAULT TABLES
// ============================================================================

/// Keywords per category, in category order.
static DEFAULT_KEYWORDS: &[(EmotionLabel, &[&str])] = &[
    (EmotionLabel::Sadness, &["우울", "슬퍼", "울었", "외로", "눈물"]),
    (EmotionLabel::Joy, &["좋아", "행복", "웃", "사랑", "기뻐"]),
    (EmotionLabel::Anger, &["화나", "짜증", "열받", "분노"]),
    (EmotionLabel::Calm, &["편안", "조용", "차분", "평온"]),
    (EmotionLabel::Excited, &["신나", "흥분", "재밌", "놀", "댄스"]),
];

/// Fallback emotions consulted when a primary pool is undersized.
static DEFAULT_SIMILARITY: &[(EmotionLabel, &[EmotionLabel])] = &[
    (EmotionLabel::Sadness, &[EmotionLabel::Calm]),
    (EmotionLabel::Joy, &[EmotionLabel::Excited, EmotionLabel::Calm]),
    (EmotionLabel::Anger, &[EmotionLabel::Excited, EmotionLabel::Sadness]),
    (EmotionLabel::Calm, &[EmotionLabel::Sadness, EmotionLabel::Joy]),
    (EmotionLabel::Excited, &[EmotionLabel::Joy, EmotionLabel::Anger]),
];

pub static BUILTIN_KEYWORDS: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(
        DEFAULT_KEYWORDS
            .iter()
            .map(|(label, words)| (*label, words.iter().map(|w| w.to_string()).collect())),
    )
    .expect("built-in keyword table is valid")
});

pub static BUILTIN_SIMILARITY: Lazy<SimilarityMap> = Lazy::new(|| {
    SimilarityMap::new(
        DEFAULT_SIMILARITY
            .iter()
            .map(|(label, fallbacks)| (*label, fallbacks.to_vec())),
    )
    .expect("built-in similarity table is valid")
});

// ============================================================================
// KEYWORD SET
// ============================================================================

/// Mapping from taggable label to its keywords, held in category order.
/// Keywords are stored normalized; order within a list is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSet {
    entries: Vec<(EmotionLabel, Vec<String>)>,
}

impl KeywordSet {
    /// Build a keyword set, rejecting `unknown`, repeated labels, and empty lists.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (EmotionLabel, Vec<String>)>,
    {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for (label, words) in entries {
            if label.is_unknown() {
                bail!("keyword table cannot contain 'unknown'");
            }
            if !seen.insert(label) {
                bail!("keyword table lists '{}' more than once", label);
            }
            let words: Vec<String> = words
                .iter()
                .map(|w| normalize_text(w))
                .filter(|w| !w.is_empty())
                .collect();
            if words.is_empty() {
                bail!("keyword list for '{}' is empty", label);
            }
            out.push((label, words));
        }
        out.sort_by_key(|(label, _)| label.category_index());
        Ok(Self { entries: out })
    }

    /// Categories with their keywords, in category order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, &[String])> {
        self.entries.iter().map(|(l, w)| (*l, w.as_slice()))
    }

    pub fn keywords_for(&self, label: EmotionLabel) -> &[String] {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, w)| w.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        BUILTIN_KEYWORDS.clone()
    }
}

// ============================================================================
// SIMILARITY MAP
// ============================================================================

/// Mapping from label to ordered fallback labels.
/// Never contains `unknown`; a label is never its own fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMap {
    entries: Vec<(EmotionLabel, Vec<EmotionLabel>)>,
}

impl SimilarityMap {
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (EmotionLabel, Vec<EmotionLabel>)>,
    {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for (label, fallbacks) in entries {
            if label.is_unknown() {
                bail!("similarity map cannot use 'unknown' as a key");
            }
            if !seen.insert(label) {
                bail!("similarity map lists '{}' more than once", label);
            }
            let mut listed = FxHashSet::default();
            for &fallback in &fallbacks {
                if fallback.is_unknown() {
                    bail!("similarity map entry for '{}' contains 'unknown'", label);
                }
                if fallback == label {
                    bail!("'{}' cannot be its own fallback", label);
                }
                if !listed.insert(fallback) {
                    bail!("similarity map entry for '{}' repeats '{}'", label, fallback);
                }
            }
            out.push((label, fallbacks));
        }
        out.sort_by_key(|(label, _)| label.category_index());
        Ok(Self { entries: out })
    }

    /// Fallback labels for `label`, in order. Empty when none are configured.
    pub fn fallbacks(&self, label: EmotionLabel) -> &[EmotionLabel] {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, f)| f.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for SimilarityMap {
    fn default() -> Self {
        BUILTIN_SIMILARITY.clone()
    }
}

// ============================================================================
// TABLES FILE
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TablesFile {
    #[serde(default)]
    keywords: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    similarity: Option<BTreeMap<String, Vec<String>>>,
}

/// Keyword and similarity tables in effect for one process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub keywords: KeywordSet,
    pub similarity: SimilarityMap,
}

impl Tables {
    /// Parse a JSON tables document. Missing sections fall back to the built-ins.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TablesFile = serde_json::from_str(json).context("Invalid tables JSON")?;

        let keywords = match file.keywords {
            Some(map) => KeywordSet::new(
                map.into_iter()
                    .map(|(k, v)| -> Result<(EmotionLabel, Vec<String>)> {
                        Ok((k.parse::<EmotionLabel>()?, v))
                    })
                    .collect::<Result<Vec<_>>>()?,
            )?,
            None => KeywordSet::default(),
        };

        let similarity = match file.similarity {
            Some(map) => SimilarityMap::new(
                map.into_iter()
                    .map(|(k, v)| -> Result<(EmotionLabel, Vec<EmotionLabel>)> {
                        let fallbacks = v
                            .iter()
                            .map(|s| s.parse::<EmotionLabel>())
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        Ok((k.parse::<EmotionLabel>()?, fallbacks))
                    })
                    .collect::<Result<Vec<_>>>()?,
            )?,
            None => SimilarityMap::default(),
        };

        Ok(Self {
            keywords,
            similarity,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tables file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid tables file {}", path.display()))
    }
}
