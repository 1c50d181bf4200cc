//! Keyword scoring for emotion classification.
//!
//! Scoring is a pure function of (normalized text, keyword set). Each
//! distinct keyword contributes at most one point, however often it occurs.

use crate::models::EmotionLabel;
use crate::tables::KeywordSet;

/// Per-category hit count for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScore {
    pub label: EmotionLabel,
    pub hits: usize,
}

/// True if any keyword occurs as a substring of `text`.
/// `text` must already be normalized.
pub fn any_keyword_matches(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Number of distinct keywords occurring in `text`.
pub fn count_keyword_hits(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}

/// Score every category in category order.
pub fn score_categories(text: &str, keywords: &KeywordSet) -> Vec<CategoryScore> {
    keywords
        .iter()
        .map(|(label, words)| CategoryScore {
            label,
            hits: count_keyword_hits(text, words),
        })
        .collect()
}

/// Category with the highest hit count.
/// Ties go to the category that comes first in category order.
/// Returns None when no category has a hit.
pub fn best_category(scores: &[CategoryScore]) -> Option<CategoryScore> {
    scores.iter().fold(None, |best: Option<CategoryScore>, s| match best {
        Some(b) if b.hits >= s.hits => Some(b),
        _ if s.hits > 0 => Some(*s),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        assert_eq!(count_keyword_hits("행복 행복 행복", &words(&["행복"])), 1);
        assert_eq!(count_keyword_hits("행복하고 사랑해", &words(&["행복", "사랑", "웃"])), 2);
    }

    #[test]
    fn test_any_keyword_matches_substring() {
        assert!(any_keyword_matches("너무 우울해서", &words(&["우울"])));
        assert!(!any_keyword_matches("그냥 그래", &words(&["우울", "슬퍼"])));
    }

    #[test]
    fn test_best_category_strictly_higher_wins() {
        let scores = vec![
            CategoryScore { label: EmotionLabel::Sadness, hits: 1 },
            CategoryScore { label: EmotionLabel::Joy, hits: 2 },
        ];
        assert_eq!(best_category(&scores).map(|s| s.label), Some(EmotionLabel::Joy));
    }

    #[test]
    fn test_best_category_tie_goes_to_first() {
        let scores = vec![
            CategoryScore { label: EmotionLabel::Joy, hits: 2 },
            CategoryScore { label: EmotionLabel::Anger, hits: 0 },
            CategoryScore { label: EmotionLabel::Calm, hits: 2 },
        ];
        assert_eq!(best_category(&scores).map(|s| s.label), Some(EmotionLabel::Joy));
    }

    #[test]
    fn test_best_category_none_when_all_zero() {
        let scores = vec![
            CategoryScore { label: EmotionLabel::Joy, hits: 0 },
            CategoryScore { label: EmotionLabel::Calm, hits: 0 },
        ];
        assert_eq!(best_category(&scores), None);
        assert_eq!(best_category(&[]), None);
    }
}
