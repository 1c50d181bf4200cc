//! Popularity ranking with similar-emotion fallback.
//!
//! The primary pool is every catalog entry tagged with the requested label.
//! When it holds fewer than `top_n` entries and a similarity map is supplied,
//! whole fallback pools are appended in map order until the pool reaches
//! `top_n` or the fallbacks run out. The pool is then ordered by popularity
//! (descending, catalog order breaking ties) and cut to `top_n`.

use crate::catalog::Catalog;
use crate::models::{CatalogEntry, EmotionLabel};
use crate::tables::SimilarityMap;

/// Result of ranking, with the fallback labels that contributed entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    pub label: EmotionLabel,
    pub entries: Vec<&'a CatalogEntry>,
    pub expanded_with: Vec<EmotionLabel>,
}

impl Ranking<'_> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Indices of entries tagged `label`, in catalog order.
fn pool_indices(catalog: &Catalog, label: EmotionLabel) -> impl Iterator<Item = usize> + '_ {
    catalog
        .entries()
        .iter()
        .enumerate()
        .filter(move |(_, e)| e.emotion == label)
        .map(|(i, _)| i)
}

/// Rank catalog entries for `label`.
/// `unknown` and `top_n == 0` yield an empty ranking.
pub fn rank<'a>(
    catalog: &'a Catalog,
    label: EmotionLabel,
    top_n: usize,
    similarity: Option<&SimilarityMap>,
) -> Ranking<'a> {
    let mut ranking = Ranking {
        label,
        entries: Vec::new(),
        expanded_with: Vec::new(),
    };
    if label.is_unknown() || top_n == 0 {
        return ranking;
    }

    let mut pool: Vec<usize> = pool_indices(catalog, label).collect();

    if let Some(map) = similarity {
        for &fallback in map.fallbacks(label) {
            if pool.len() >= top_n {
                break;
            }
            let before = pool.len();
            pool.extend(pool_indices(catalog, fallback));
            if pool.len() > before {
                ranking.expanded_with.push(fallback);
            }
        }
    }

    let entries = catalog.entries();
    pool.sort_by(|&a, &b| {
        // Primary: popularity (higher is better)
        // Tiebreaker: earlier catalog position
        entries[b]
            .popularity
            .total_cmp(&entries[a].popularity)
            .then_with(|| a.cmp(&b))
    });
    pool.truncate(top_n);

    ranking.entries = pool.into_iter().map(|i| &entries[i]).collect();
    ranking
}

/// Top `top_n` entries for `label`, most popular first.
pub fn recommend<'a>(
    catalog: &'a Catalog,
    label: EmotionLabel,
    top_n: usize,
    similarity: Option<&SimilarityMap>,
) -> Vec<&'a CatalogEntry> {
    rank(catalog, label, top_n, similarity).entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(song: &str, emotion: EmotionLabel, popularity: f64) -> CatalogEntry {
        CatalogEntry {
            song: song.to_string(),
            artist: format!("{} artist", song),
            emotion,
            popularity,
        }
    }

    fn songs(entries: &[&CatalogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.song.clone()).collect()
    }

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            entry("Song A", EmotionLabel::Joy, 90.0),
            entry("Song B", EmotionLabel::Joy, 50.0),
            entry("Song C", EmotionLabel::Sadness, 99.0),
        ])
    }

    fn wide() -> Catalog {
        Catalog::from_entries(vec![
            entry("j1", EmotionLabel::Joy, 10.0),
            entry("s1", EmotionLabel::Sadness, 70.0),
            entry("e1", EmotionLabel::Excited, 95.0),
            entry("j2", EmotionLabel::Joy, 30.0),
            entry("c1", EmotionLabel::Calm, 60.0),
            entry("e2", EmotionLabel::Excited, 20.0),
            entry("c2", EmotionLabel::Calm, 40.0),
            entry("s2", EmotionLabel::Sadness, 80.0),
        ])
    }

    fn map(pairs: Vec<(EmotionLabel, Vec<EmotionLabel>)>) -> SimilarityMap {
        SimilarityMap::new(pairs).unwrap()
    }

    #[test]
    fn test_joy_sorted_by_popularity() {
        let catalog = sample();
        let result = recommend(&catalog, EmotionLabel::Joy, 5, None);
        assert_eq!(songs(&result), vec!["Song A", "Song B"]);
    }

    #[test]
    fn test_unknown_is_empty() {
        let catalog = sample();
        assert!(recommend(&catalog, EmotionLabel::Unknown, 5, None).is_empty());
        let full = SimilarityMap::default();
        assert!(recommend(&catalog, EmotionLabel::Unknown, 5, Some(&full)).is_empty());
    }

    #[test]
    fn test_zero_top_n_is_empty() {
        let catalog = sample();
        assert!(recommend(&catalog, EmotionLabel::Joy, 0, None).is_empty());
    }

    #[test]
    fn test_never_exceeds_top_n_and_non_increasing() {
        let catalog = wide();
        let similarity = SimilarityMap::default();
        for label in EmotionLabel::CATEGORIES {
            for top_n in 1..=10 {
                let result = recommend(&catalog, label, top_n, Some(&similarity));
                assert!(result.len() <= top_n);
                assert!(result
                    .windows(2)
                    .all(|w| w[0].popularity >= w[1].popularity));
            }
        }
    }

    #[test]
    fn test_anger_falls_back_to_sadness() {
        let catalog = Catalog::from_entries(vec![
            entry("low", EmotionLabel::Sadness, 10.0),
            entry("joy", EmotionLabel::Joy, 99.0),
            entry("high", EmotionLabel::Sadness, 60.0),
        ]);
        let similarity = map(vec![(EmotionLabel::Anger, vec![EmotionLabel::Sadness])]);
        let ranking = rank(&catalog, EmotionLabel::Anger, 5, Some(&similarity));
        assert_eq!(songs(&ranking.entries), vec!["high", "low"]);
        assert_eq!(ranking.expanded_with, vec![EmotionLabel::Sadness]);
    }

    #[test]
    fn test_no_fallback_without_map() {
        let catalog = wide();
        assert!(recommend(&catalog, EmotionLabel::Anger, 5, None).is_empty());
    }

    #[test]
    fn test_empty_fallback_pool_not_reported() {
        let catalog = sample();
        let similarity = map(vec![(
            EmotionLabel::Joy,
            vec![EmotionLabel::Excited, EmotionLabel::Calm],
        )]);
        let ranking = rank(&catalog, EmotionLabel::Joy, 5, Some(&similarity));
        assert_eq!(songs(&ranking.entries), vec!["Song A", "Song B"]);
        assert!(ranking.expanded_with.is_empty());

        let similarity = map(vec![(
            EmotionLabel::Joy,
            vec![EmotionLabel::Calm, EmotionLabel::Sadness],
        )]);
        let ranking = rank(&catalog, EmotionLabel::Joy, 5, Some(&similarity));
        assert_eq!(ranking.expanded_with, vec![EmotionLabel::Sadness]);
        assert_eq!(songs(&ranking.entries), vec!["Song C", "Song A", "Song B"]);
    }

    #[test]
    fn test_full_primary_pool_skips_fallback() {
        let catalog = wide();
        // joy has 2 entries; excited entries are more popular but must not appear
        let similarity = map(vec![(EmotionLabel::Joy, vec![EmotionLabel::Excited])]);
        let ranking = rank(&catalog, EmotionLabel::Joy, 2, Some(&similarity));
        assert_eq!(songs(&ranking.entries), vec!["j2", "j1"]);
        assert!(ranking.expanded_with.is_empty());
    }

    #[test]
    fn test_expansion_stops_once_pool_is_full() {
        let catalog = wide();
        // joy (2) + excited (2) reaches 3, so calm is never consulted
        let similarity = map(vec![(
            EmotionLabel::Joy,
            vec![EmotionLabel::Excited, EmotionLabel::Calm],
        )]);
        let ranking = rank(&catalog, EmotionLabel::Joy, 3, Some(&similarity));
        assert_eq!(ranking.expanded_with, vec![EmotionLabel::Excited]);
        assert_eq!(songs(&ranking.entries), vec!["e1", "j2", "e2"]);
    }

    #[test]
    fn test_pool_size_is_min_of_top_n_and_exhausted_pools() {
        let catalog = wide();
        let similarity = map(vec![(
            EmotionLabel::Joy,
            vec![EmotionLabel::Excited, EmotionLabel::Calm],
        )]);
        // 2 joy + 2 excited + 2 calm = 6 available
        assert_eq!(recommend(&catalog, EmotionLabel::Joy, 5, Some(&similarity)).len(), 5);
        assert_eq!(recommend(&catalog, EmotionLabel::Joy, 10, Some(&similarity)).len(), 6);
    }

    #[test]
    fn test_equal_popularity_keeps_catalog_order() {
        let catalog = Catalog::from_entries(vec![
            entry("first", EmotionLabel::Calm, 50.0),
            entry("top", EmotionLabel::Calm, 80.0),
            entry("second", EmotionLabel::Calm, 50.0),
            entry("third", EmotionLabel::Calm, 50.0),
        ]);
        let result = recommend(&catalog, EmotionLabel::Calm, 3, None);
        assert_eq!(songs(&result), vec!["top", "first", "second"]);
    }

    #[test]
    fn test_fallback_tie_keeps_catalog_order() {
        let catalog = Catalog::from_entries(vec![
            entry("fallback-early", EmotionLabel::Calm, 50.0),
            entry("primary-late", EmotionLabel::Sadness, 50.0),
        ]);
        let similarity = map(vec![(EmotionLabel::Sadness, vec![EmotionLabel::Calm])]);
        let result = recommend(&catalog, EmotionLabel::Sadness, 5, Some(&similarity));
        assert_eq!(songs(&result), vec!["fallback-early", "primary-late"]);
    }
}
