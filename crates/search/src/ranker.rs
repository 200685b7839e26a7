use crate::tfidf::{cosine_distance, TfIdfModel};
use std::sync::Arc;
use wikipath_page_store::Page;

/// Distances closer than this compare equal when ordering candidates.
const DISTANCE_RESOLUTION: f64 = 1e-9;

fn tie_key(distance: f64) -> i64 {
    (distance / DISTANCE_RESOLUTION).round() as i64
}

/// A candidate page and its distance to the target.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub page: Arc<Page>,
    pub distance: f64,
}

/// Orders candidate pages by TF-IDF cosine distance to a target page.
///
/// The vector space is fit on the candidates of a single call, so every hop
/// is ranked independently of earlier ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker;

impl SimilarityRanker {
    pub fn new() -> Self {
        Self
    }

    /// Rank `candidates`, most similar first.
    ///
    /// Candidates with empty text are left out entirely. Equal distances keep
    /// their input order. An empty result means nothing usable was offered.
    pub fn rank(&self, candidates: &[Arc<Page>], target: &Page) -> Vec<Ranked> {
        let usable: Vec<&Arc<Page>> = candidates
            .iter()
            .filter(|page| !page.text.trim().is_empty())
            .collect();
        if usable.is_empty() {
            return Vec::new();
        }

        let texts: Vec<&str> = usable.iter().map(|page| page.text.as_str()).collect();
        let (model, vectors) = TfIdfModel::fit_transform(&texts);
        let target_vector = model.transform(&target.text);
        log::debug!(
            "Ranking {} candidates over {} terms against '{}'",
            usable.len(),
            model.vocabulary_len(),
            target.name
        );

        let mut ranked: Vec<Ranked> = usable
            .into_iter()
            .zip(vectors)
            .map(|(page, vector)| Ranked {
                page: Arc::clone(page),
                distance: cosine_distance(&target_vector, &vector),
            })
            .collect();
        // Stable: ties, including ones that differ only by rounding noise,
        // keep candidate order.
        ranked.sort_by_key(|r| tie_key(r.distance));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn page(name: &str, text: &str) -> Arc<Page> {
        Arc::new(Page::new(name, text, Vec::new()))
    }

    fn names(ranked: &[Ranked]) -> Vec<&str> {
        ranked.iter().map(|r| r.page.name.as_str()).collect()
    }

    #[test]
    fn most_similar_candidate_comes_first() {
        let target = page("Apple", "apple fruit tree orchard sweet");
        let candidates = vec![
            page("Car", "car engine wheel road"),
            page("Pear", "pear fruit tree sweet"),
            page("Orchard", "orchard apple tree harvest sweet"),
        ];
        let ranked = SimilarityRanker::new().rank(&candidates, &target);
        assert_eq!(names(&ranked), vec!["Orchard", "Pear", "Car"]);
        assert!(ranked[0].distance < ranked[1].distance);
        assert_eq!(ranked[2].distance, 1.0);
    }

    #[test]
    fn empty_texts_are_excluded() {
        let target = page("Apple", "apple fruit");
        let candidates = vec![
            page("Blank", ""),
            page("Pear", "pear fruit"),
            page("Spaces", "   "),
        ];
        let ranked = SimilarityRanker::new().rank(&candidates, &target);
        assert_eq!(names(&ranked), vec!["Pear"]);
    }

    #[test]
    fn no_usable_candidates_yields_empty() {
        let target = page("Apple", "apple fruit");
        assert!(SimilarityRanker::new().rank(&[], &target).is_empty());
        assert!(SimilarityRanker::new()
            .rank(&[page("Blank", "")], &target)
            .is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let target = page("Comet", "comet orbit ice");
        let candidates = vec![
            page("Zebra", "zebra stripes"),
            page("Apple", "apple fruit"),
            page("Mango", "mango fruit"),
        ];
        let ranked = SimilarityRanker::new().rank(&candidates, &target);
        assert_eq!(names(&ranked), vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn mathematical_ties_keep_input_order_on_every_call() {
        // Same term-count multiset in a different order, so each candidate is
        // exactly as close to the target as the other.
        let patterns = [
            ("aa bb cc dd ee", "ff gg hh ii jj"),
            ("aa aa bb cc dd", "ff gg gg hh ii"),
            ("aa aa aa bb cc", "ff gg hh hh hh"),
            ("aa bb bb cc cc", "ff ff gg gg hh"),
        ];
        let target = page("Target", "aa bb cc dd ee ff gg hh ii jj");
        for (first, second) in patterns {
            let a = page("A", first);
            let b = page("B", second);
            for _ in 0..200 {
                let ranked = SimilarityRanker::new().rank(&[a.clone(), b.clone()], &target);
                assert_eq!(names(&ranked), vec!["A", "B"]);
                let ranked = SimilarityRanker::new().rank(&[b.clone(), a.clone()], &target);
                assert_eq!(names(&ranked), vec!["B", "A"]);
            }
        }
    }

    #[test]
    fn empty_target_ranks_everything_equally() {
        let target = page("Nothing", "");
        let candidates = vec![page("B", "beta words"), page("A", "alpha words")];
        let ranked = SimilarityRanker::new().rank(&candidates, &target);
        assert_eq!(names(&ranked), vec!["B", "A"]);
        assert!(ranked.iter().all(|r| r.distance == 1.0));
    }

    proptest! {
        #[test]
        fn proptest_rank_is_a_filtered_permutation(
            texts in prop::collection::vec(
                prop_oneof![Just(String::new()), "[a-e]{2,4}( [a-e]{2,4}){0,5}"],
                0..12,
            ),
            target in "[a-e]{2,4}( [a-e]{2,4}){0,5}",
        ) {
            let candidates: Vec<Arc<Page>> = texts
                .iter()
                .enumerate()
                .map(|(i, text)| page(&format!("P{i}"), text))
                .collect();
            let target = page("Target", &target);
            let ranked = SimilarityRanker::new().rank(&candidates, &target);

            let expected: Vec<&str> = candidates
                .iter()
                .filter(|p| !p.text.is_empty())
                .map(|p| p.name.as_str())
                .collect();
            let mut got = names(&ranked);
            prop_assert!(ranked
                .windows(2)
                .all(|w| tie_key(w[0].distance) <= tie_key(w[1].distance)));
            prop_assert!(ranked.iter().all(|r| (0.0..=1.0 + 1e-9).contains(&r.distance)));

            // Equal distances preserve input order.
            for w in ranked.windows(2) {
                if tie_key(w[0].distance) == tie_key(w[1].distance) {
                    let a: usize = w[0].page.name[1..].parse().unwrap();
                    let b: usize = w[1].page.name[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }

            got.sort();
            let mut expected = expected;
            expected.sort();
            prop_assert_eq!(got, expected);
        }
    }
}
