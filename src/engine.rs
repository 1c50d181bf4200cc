//! Host-facing engine: text in, response out.
//!
//! The engine owns a shared handle to the loaded catalog plus the tables
//! chosen at start-up. `respond` never calls the ranker for blank or
//! unrecognized text. The catalog is only ever replaced wholesale through
//! `reload_catalog`.

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::models::{CatalogEntry, EmotionLabel};
use crate::normalize::is_blank;
use crate::recommend::rank;
use crate::tables::SimilarityMap;

/// Default playlist length.
pub const DEFAULT_TOP_N: usize = 5;

/// What the host should render for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Response {
    /// Empty or whitespace-only input; rejected before classification.
    BlankInput,
    /// No emotional signal found.
    Unrecognized,
    /// A label was found but no catalog entries match it (even after fallback).
    NoMatches { label: EmotionLabel },
    Playlist {
        label: EmotionLabel,
        entries: Vec<CatalogEntry>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        expanded_with: Vec<EmotionLabel>,
    },
}

impl Response {
    /// Label to display, if classification produced one.
    pub fn label(&self) -> Option<EmotionLabel> {
        match self {
            Response::BlankInput => None,
            Response::Unrecognized => Some(EmotionLabel::Unknown),
            Response::NoMatches { label } | Response::Playlist { label, .. } => Some(*label),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Arc<Catalog>,
    classifier: Classifier,
    similarity: Option<SimilarityMap>,
    top_n: usize,
}

impl Engine {
    /// `similarity` of None disables fallback expansion. `top_n` is clamped to at least 1.
    pub fn new(
        catalog: Arc<Catalog>,
        classifier: Classifier,
        similarity: Option<SimilarityMap>,
        top_n: usize,
    ) -> Self {
        Self {
            catalog,
            classifier,
            similarity,
            top_n: top_n.max(1),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn fallback_enabled(&self) -> bool {
        self.similarity.is_some()
    }

    /// Swap in a freshly loaded catalog. Calls already holding the old
    /// handle finish against it.
    pub fn reload_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
    }

    pub fn classify(&self, text: &str) -> EmotionLabel {
        self.classifier.classify(text)
    }

    pub fn respond(&self, text: &str) -> Response {
        if is_blank(text) {
            return Response::BlankInput;
        }
        let label = self.classifier.classify(text);
        if label.is_unknown() {
            return Response::Unrecognized;
        }

        let ranking = rank(&self.catalog, label, self.top_n, self.similarity.as_ref());
        if ranking.is_empty() {
            return Response::NoMatches { label };
        }
        Response::Playlist {
            label,
            entries: ranking.entries.into_iter().cloned().collect(),
            expanded_with: ranking.expanded_with,
        }
    }
}
