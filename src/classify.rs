//! Emotion classification strategies.
//!
//! A `Classifier` is chosen once at start-up and then used for every query:
//! - `FirstMatch`: first category (in category order) with any keyword hit wins
//! - `FrequencyWeighted`: category with the most distinct keyword hits wins,
//!   ties broken by category order
//! - `Delegated`: an external sentiment model, remapped into the label space
//!
//! Classification never fails. Blank text, no keyword hits, and an unavailable
//! external model all come back as `EmotionLabel::Unknown`.

use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::EmotionLabel;
use crate::normalize::{is_blank, normalize_text};
use crate::scoring::{any_keyword_matches, best_category, score_categories};
use crate::tables::KeywordSet;

// ============================================================================
// External Model Boundary
// ============================================================================

/// Raw output of an external text-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPrediction {
    pub class_index: usize,
    pub probabilities: Vec<f32>,
}

/// A hosted sentiment model. Loading and inference belong to the implementor.
pub trait SentimentModel: Send + Sync {
    fn predict(&self, text: &str) -> Result<ExternalPrediction>;
}

/// Remap a 3-way sentiment index (negative, neutral, positive) to a label.
pub fn remap_sentiment_index(index: usize) -> EmotionLabel {
    match index {
        0 => EmotionLabel::Sadness,
        1 => EmotionLabel::Calm,
        2 => EmotionLabel::Joy,
        _ => EmotionLabel::Unknown,
    }
}

/// Remap a sentiment class name to a label. Case-insensitive.
pub fn remap_sentiment_name(name: &str) -> EmotionLabel {
    match name.trim().to_lowercase().as_str() {
        "negative" | "neg" => EmotionLabel::Sadness,
        "neutral" | "neu" => EmotionLabel::Calm,
        "positive" | "pos" => EmotionLabel::Joy,
        _ => EmotionLabel::Unknown,
    }
}

/// Run the external model and remap its answer.
/// A model failure is logged and reported as (None, Unknown).
pub fn classify_external(model: &dyn SentimentModel, text: &str) -> (Option<usize>, EmotionLabel) {
    if is_blank(text) {
        return (None, EmotionLabel::Unknown);
    }
    match model.predict(text) {
        Ok(prediction) => (
            Some(prediction.class_index),
            remap_sentiment_index(prediction.class_index),
        ),
        Err(e) => {
            eprintln!("[classify] external model unavailable: {:#}", e);
            (None, EmotionLabel::Unknown)
        }
    }
}

// ============================================================================
// Policy Selection
// ============================================================================

/// Keyword policy names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordPolicy {
    #[default]
    FirstMatch,
    FrequencyWeighted,
}

impl FromStr for KeywordPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first-match" | "first" => Ok(KeywordPolicy::FirstMatch),
            "frequency" | "frequency-weighted" | "weighted" => Ok(KeywordPolicy::FrequencyWeighted),
            other => anyhow::bail!(
                "unknown policy '{}' (expected 'first-match' or 'frequency')",
                other
            ),
        }
    }
}

impl fmt::Display for KeywordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordPolicy::FirstMatch => f.write_str("first-match"),
            KeywordPolicy::FrequencyWeighted => f.write_str("frequency"),
        }
    }
}

// ============================================================================
// Classifier
// ============================================================================

#[derive(Clone)]
pub enum Classifier {
    FirstMatch(KeywordSet),
    FrequencyWeighted(KeywordSet),
    Delegated(Arc<dyn SentimentModel>),
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classifier::FirstMatch(k) => f.debug_tuple("FirstMatch").field(k).finish(),
            Classifier::FrequencyWeighted(k) => f.debug_tuple("FrequencyWeighted").field(k).finish(),
            Classifier::Delegated(_) => f.write_str("Delegated(..)"),
        }
    }
}

impl Classifier {
    pub fn keyword(policy: KeywordPolicy, keywords: KeywordSet) -> Self {
        match policy {
            KeywordPolicy::FirstMatch => Classifier::FirstMatch(keywords),
            KeywordPolicy::FrequencyWeighted => Classifier::FrequencyWeighted(keywords),
        }
    }

    pub fn delegated(model: Arc<dyn SentimentModel>) -> Self {
        Classifier::Delegated(model)
    }

    pub fn policy_name(&self) -> &'static str {
        match self {
            Classifier::FirstMatch(_) => "first-match",
            Classifier::FrequencyWeighted(_) => "frequency",
            Classifier::Delegated(_) => "delegated",
        }
    }

    /// Map free text to a single emotion label.
    pub fn classify(&self, text: &str) -> EmotionLabel {
        if is_blank(text) {
            return EmotionLabel::Unknown;
        }
        match self {
            Classifier::FirstMatch(keywords) => first_match(&normalize_text(text), keywords),
            Classifier::FrequencyWeighted(keywords) => {
                frequency_weighted(&normalize_text(text), keywords)
            }
            Classifier::Delegated(model) => classify_external(model.as_ref(), text).1,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::FirstMatch(KeywordSet::default())
    }
}

fn first_match(text: &str, keywords: &KeywordSet) -> EmotionLabel {
    keywords
        .iter()
        .find(|(_, words)| any_keyword_matches(text, words))
        .map(|(label, _)| label)
        .unwrap_or(EmotionLabel::Unknown)
}

fn frequency_weighted(text: &str, keywords: &KeywordSet) -> EmotionLabel {
    best_category(&score_categories(text, keywords))
        .map(|s| s.label)
        .unwrap_or(EmotionLabel::Unknown)
}
