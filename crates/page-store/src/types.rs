use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A fetched article. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Canonical page name.
    pub name: String,
    /// Normalized article text.
    pub text: String,
    /// Canonical names of outbound links, in source order.
    pub links: Vec<String>,
}

impl Page {
    pub fn new(name: impl Into<String>, text: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            links,
        }
    }

    pub fn links_to(&self, name: &str) -> bool {
        self.links.iter().any(|link| link == name)
    }
}

/// Cached page plus usage bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub page: Arc<Page>,
    /// Epoch seconds of the last access.
    pub last_used: f64,
    /// Number of accesses, starting at 1 on insert.
    pub times_used: u64,
}

impl CacheEntry {
    pub fn fresh(page: Page) -> Self {
        Self {
            page: Arc::new(page),
            last_used: epoch_secs(),
            times_used: 1,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_used = epoch_secs().max(self.last_used);
        self.times_used = self.times_used.saturating_add(1);
    }
}

pub(crate) fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}
