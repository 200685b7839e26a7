use crate::error::SourceError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use wikipath_text::canonical_name;

/// What a page source knows about one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePage {
    /// The page does not exist. Terminal for this name within a run.
    Missing,
    /// Raw (not yet normalized) text and outbound link names.
    Found { text: String, links: Vec<String> },
}

/// Provider of raw pages, usually a remote wiki.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, name: &str) -> std::result::Result<SourcePage, SourceError>;
}

/// In-memory page source that records how often each name was requested.
#[derive(Debug, Default)]
pub struct StaticSource {
    pages: HashMap<String, (String, Vec<String>)>,
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, name: &str, text: &str, links: &[&str]) -> Self {
        self.pages.insert(
            canonical_name(name),
            (
                text.to_string(),
                links.iter().map(|l| (*l).to_string()).collect(),
            ),
        );
        self
    }

    /// Requests for `name` fail with a transport error.
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(canonical_name(name));
        self
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&canonical_name(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch(&self, name: &str) -> std::result::Result<SourcePage, SourceError> {
        let key = canonical_name(name);
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(0) += 1;

        if self.failing.contains(&key) {
            return Err(SourceError::Transport(format!("{key} is unreachable")));
        }
        Ok(match self.pages.get(&key) {
            Some((text, links)) => SourcePage::Found {
                text: text.clone(),
                links: links.clone(),
            },
            None => SourcePage::Missing,
        })
    }
}
