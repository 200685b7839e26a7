//! # Wikipath Text
//!
//! Stateless text handling shared by the page cache and the similarity ranker.
//!
//! ## Pipeline
//!
//! ```text
//! raw article text
//!     │
//!     ├──> strip digit runs
//!     ├──> Unicode word segmentation
//!     ├──> lower-case + stopword removal
//!     └──> punctuation strip, whitespace collapse
//!            └─> normalized text (cached with the page)
//! ```
//!
//! Page names go through [`canonical_name`] before they are used as cache keys,
//! route entries or link comparisons.
//!
//! ## Example
//!
//! ```rust
//! use wikipath_text::{canonical_name, Normalizer};
//!
//! let normalizer = Normalizer::english();
//! assert_eq!(normalizer.normalize("The 3 Apples of 1999!"), "apples");
//! assert_eq!(canonical_name("apple_inc."), "Apple inc.");
//! ```

mod names;
mod normalizer;
mod stopwords;
mod terms;

pub use names::{canonical_name, page_slug};
pub use normalizer::Normalizer;
pub use stopwords::ENGLISH_STOPWORDS;
pub use terms::tokenize_terms;
