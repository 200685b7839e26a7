use std::collections::{BTreeMap, HashMap, HashSet};
use wikipath_text::tokenize_terms;

/// L2-normalized sparse term-weight vector keyed by vocabulary index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<usize, f64>,
}

impl SparseVector {
    fn normalized(mut weights: BTreeMap<usize, f64>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in weights.values_mut() {
                *w /= norm;
            }
        } else {
            weights.clear();
        }
        Self { weights }
    }

    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .filter_map(|(idx, w)| large.weights.get(idx).map(|o| w * o))
            .sum()
    }
}

/// `1 - cosine similarity`. A zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 1.0;
    }
    (1.0 - a.dot(b)).clamp(0.0, 2.0)
}

/// TF-IDF space fit on a fixed set of documents.
///
/// Uses raw term counts and smoothed idf, `ln((1 + n) / (1 + df)) + 1`.
/// Terms outside the fitted vocabulary are ignored by [`TfIdfModel::transform`].
#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        Self::fit_transform(documents).0
    }

    /// Fit on `documents` and return their vectors in input order.
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> (Self, Vec<SparseVector>) {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenize_terms(doc.as_ref()))
            .collect();

        // Indices follow first appearance; summation order, and so the exact
        // distance bits, depend on them.
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: HashSet<&str> = HashSet::with_capacity(tokens.len());
            for term in tokens {
                if !seen.insert(term.as_str()) {
                    continue;
                }
                let next = vocabulary.len();
                let idx = *vocabulary.entry(term.clone()).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                df[idx] += 1;
            }
        }

        let n_docs = documents.len() as f64;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n_docs) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let model = Self { vocabulary, idf };
        let vectors = tokenized
            .iter()
            .map(|tokens| model.vectorize(tokens))
            .collect();
        (model, vectors)
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        self.vectorize(&tokenize_terms(text))
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        for (idx, count) in counts.iter_mut() {
            *count *= self.idf[*idx];
        }
        SparseVector::normalized(counts)
    }
}
