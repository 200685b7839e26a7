//! # Wikipath Page Store
//!
//! Persistent get-or-fetch cache of wiki pages.
//!
//! ## Architecture
//!
//! ```text
//! get(name)
//!     │
//!     ├──> canonical name ──> cache hit? ──> bump lastUsed/timesUsed
//!     │
//!     └──> PageSource::fetch (bounded concurrency, per-fetch timeout)
//!            ├─ Missing  ──> NotFound (never cached)
//!            └─ Found    ──> Normalizer ──> Page ──> CacheEntry { timesUsed: 1 }
//!
//! load()/save()
//!     └──> JSON snapshot | one file per page | memory only
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wikipath_page_store::{PageRepository, RepositoryConfig, StaticSource};
//!
//! #[tokio::main]
//! async fn main() -> wikipath_page_store::Result<()> {
//!     let source = StaticSource::new().with_page("Love", "Love is an emotion.", &["Apple"]);
//!     let mut repo = PageRepository::new(Arc::new(source), RepositoryConfig::default());
//!     repo.load().await?;
//!
//!     let page = repo.get("Love").await?;
//!     println!("{} links to {:?}", page.name, page.links);
//!
//!     repo.save().await?;
//!     Ok(())
//! }
//! ```

mod codec;
mod error;
mod persist;
mod repository;
mod source;
mod types;

pub use codec::{decode_entry, decode_snapshot, encode_entry, encode_snapshot};
pub use error::{PageStoreError, Result, SourceError};
pub use persist::{CacheBackend, SaveReport};
pub use repository::{PageRepository, RepositoryConfig};
pub use source::{PageSource, SourcePage, StaticSource};
pub use types::{CacheEntry, Page};
