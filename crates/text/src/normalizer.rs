use crate::stopwords::ENGLISH_STOPWORDS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static DIGIT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").unwrap_or_else(|_| unreachable!("static pattern")));

/// Cleans article text before it is cached or vectorized.
///
/// Pure: the output depends only on the input and the stopword set fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Normalizer with the English stopword list.
    pub fn english() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied())
    }

    /// Normalizer for a Wikipedia language code.
    ///
    /// Only English ships a stopword list; every other language keeps all
    /// words and is still stripped of digits and punctuation.
    pub fn for_language(language: &str) -> Self {
        if language.trim().eq_ignore_ascii_case("en") {
            Self::english()
        } else {
            Self::with_stopwords(std::iter::empty::<&str>())
        }
    }

    /// Normalizer with a custom stopword set. Matching is case-insensitive.
    pub fn with_stopwords<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    /// Strip digits, drop stopwords, strip punctuation and collapse whitespace.
    ///
    /// Empty or stopword-only input yields an empty string.
    pub fn normalize(&self, raw: &str) -> String {
        let without_digits = DIGIT_RUNS.replace_all(raw, " ");

        let mut out = String::with_capacity(without_digits.len());
        for token in without_digits.split_word_bounds() {
            if token.chars().all(char::is_whitespace) {
                continue;
            }
            let lower = token.to_lowercase();
            if self.stopwords.contains(&lower) {
                continue;
            }
            let cleaned: String = lower
                .chars()
                .filter(|c| !c.is_ascii_punctuation() && !c.is_whitespace())
                .collect();
            // Non-ASCII dashes and quotes survive the filter above on their own.
            if !cleaned.chars().any(char::is_alphanumeric) {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&cleaned);
        }
        out
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english()
    }
}
