//! # Wikipath Search
//!
//! Greedy, similarity-guided path finding over a wiki link graph that is
//! never materialized.
//!
//! ## Hop loop
//!
//! ```text
//! begin(start, target) ──> route = [start]
//!     │
//!     └──> step()
//!            ├─ target linked from current?  ──> Found
//!            ├─ sample ≤ max_download links  (seeded RNG)
//!            ├─ PageRepository::get_many      (cache or source, raced against cancel)
//!            ├─ SimilarityRanker::rank        (TF-IDF fit on the frontier)
//!            └─ first unvisited candidate     ──> next hop | Exhausted
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::sync::Arc;
//! use wikipath_page_store::{PageRepository, RepositoryConfig, StaticSource};
//! use wikipath_search::{NoopObserver, PathSearch, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> wikipath_search::Result<()> {
//!     let source = StaticSource::new()
//!         .with_page("Love", "Love is an emotion.", &["Apple"])
//!         .with_page("Apple", "An apple is a fruit.", &[]);
//!     let mut repo = PageRepository::new(Arc::new(source), RepositoryConfig::default());
//!
//!     let rng = StdRng::seed_from_u64(1);
//!     let mut search = PathSearch::new(&mut repo, SearchConfig::default(), rng);
//!     let outcome = search.run("Love", "Apple", &mut NoopObserver).await?;
//!     assert_eq!(outcome.route, vec!["Love", "Apple"]);
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod ranker;
mod sampling;
mod tfidf;

pub use engine::{
    CancelFlag, HopOutcome, NoopObserver, PathSearch, SearchConfig, SearchObserver, SearchOutcome,
    SearchState, DEFAULT_MAX_DOWNLOAD,
};
pub use error::{Result, SearchError};
pub use ranker::{Ranked, SimilarityRanker};
pub use sampling::sample_frontier;
pub use tfidf::{cosine_distance, SparseVector, TfIdfModel};
