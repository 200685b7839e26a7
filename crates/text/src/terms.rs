use once_cell::sync::Lazy;
use regex::Regex;

static TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap_or_else(|_| unreachable!("static pattern")));

/// Split text into lower-cased terms of two or more word characters.
///
/// This is the vocabulary tokenizer for TF-IDF; single characters carry no
/// signal and are skipped.
pub fn tokenize_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TERM.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}
