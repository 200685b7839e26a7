use crate::error::{PageStoreError, Result};
use crate::persist::{self, CacheBackend, SaveReport};
use crate::source::{PageSource, SourcePage};
use crate::types::{CacheEntry, Page};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use wikipath_text::{canonical_name, Normalizer};

#[derive(Clone, Debug)]
pub struct RepositoryConfig {
    /// Snapshot file (or directory for [`CacheBackend::Sharded`]).
    pub path: PathBuf,
    pub backend: CacheBackend,
    /// Upper bound on concurrent source fetches in [`PageRepository::get_many`].
    pub fetch_concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pagecache.json"),
            backend: CacheBackend::File,
            fetch_concurrency: 1,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Get-or-fetch page cache.
///
/// Owns every [`CacheEntry`]; a page is fetched from the source at most once
/// per repository unless the source reports it missing or the fetch fails.
/// Nothing reaches disk until [`PageRepository::save`] is called.
pub struct PageRepository {
    entries: HashMap<String, CacheEntry>,
    source: Arc<dyn PageSource>,
    normalizer: Normalizer,
    config: RepositoryConfig,
}

impl PageRepository {
    pub fn new(source: Arc<dyn PageSource>, config: RepositoryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            source,
            normalizer: Normalizer::english(),
            config,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Replace the in-memory cache with the persisted snapshot.
    ///
    /// A missing snapshot yields an empty cache. Entries that cannot be
    /// restored are dropped with a warning.
    pub async fn load(&mut self) -> Result<usize> {
        log::debug!("Loading page cache from {:?}", self.config.path);
        self.entries = persist::load(&self.config.path, self.config.backend).await?;
        log::info!("Loaded {} cached pages", self.entries.len());
        Ok(self.entries.len())
    }

    /// Write the whole cache, overwriting the previous snapshot.
    ///
    /// Entries that could not be stored are evicted and will not be written
    /// again.
    pub async fn save(&mut self) -> Result<SaveReport> {
        let report = persist::save(&self.config.path, self.config.backend, &self.entries).await?;
        for key in &report.failed {
            if self.entries.remove(key).is_some() {
                log::warn!("Evicted '{key}' from the page cache: it cannot be persisted");
            }
        }
        log::debug!("Saved {} cached pages", report.written);
        Ok(report)
    }

    /// Return a page, fetching and caching it on first use.
    pub async fn get(&mut self, name: &str) -> Result<Arc<Page>> {
        let key = canonical_name(name);
        if key.is_empty() {
            return Err(PageStoreError::NotFound(name.to_string()));
        }
        if let Some(page) = self.bump(&key) {
            log::debug!("Cache hit: {key}");
            return Ok(page);
        }
        log::debug!("Cache miss: {key}");
        let fetched = fetch_one(self.source.as_ref(), &key, self.config.fetch_timeout).await;
        self.admit(&key, fetched)
    }

    /// Fetch several pages, reporting each finished name to `on_fetched`.
    ///
    /// Names are canonicalized and de-duplicated first. Source fetches for
    /// uncached names run concurrently (bounded by `fetch_concurrency`), but
    /// every cache update is applied here, in input order.
    pub async fn get_many<F>(
        &mut self,
        names: &[String],
        mut on_fetched: F,
    ) -> Vec<(String, Result<Arc<Page>>)>
    where
        F: FnMut(&str),
    {
        let mut seen = HashSet::with_capacity(names.len());
        let keys: Vec<String> = names
            .iter()
            .map(|name| canonical_name(name))
            .filter(|key| !key.is_empty() && seen.insert(key.clone()))
            .collect();

        let misses: Vec<String> = keys
            .iter()
            .filter(|key| !self.entries.contains_key(*key))
            .cloned()
            .collect();
        log::debug!(
            "Fetching {} pages ({} cached, {} from source)",
            keys.len(),
            keys.len() - misses.len(),
            misses.len()
        );

        let mut fetched = self.fetch_all(misses, &mut on_fetched).await;

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let result = match fetched.remove(&key) {
                Some(result) => self.admit(&key, result),
                None => match self.bump(&key) {
                    Some(page) => {
                        on_fetched(&key);
                        Ok(page)
                    }
                    None => Err(PageStoreError::NotFound(key.clone())),
                },
            };
            out.push((key, result));
        }
        out
    }

    async fn fetch_all<F>(
        &self,
        keys: Vec<String>,
        on_fetched: &mut F,
    ) -> HashMap<String, Result<SourcePage>>
    where
        F: FnMut(&str),
    {
        let semaphore = Arc::new(Semaphore::new(self.config.fetch_concurrency.max(1)));
        let timeout = self.config.fetch_timeout;
        let mut join = JoinSet::new();
        for key in keys {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            join.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = fetch_one(source.as_ref(), &key, timeout).await;
                (key, result)
            });
        }

        let mut out = HashMap::new();
        while let Some(joined) = join.join_next().await {
            match joined {
                Ok((key, result)) => {
                    on_fetched(&key);
                    out.insert(key, result);
                }
                Err(err) => log::warn!("Page fetch task failed: {err}"),
            }
        }
        out
    }

    fn bump(&mut self, key: &str) -> Option<Arc<Page>> {
        let entry = self.entries.get_mut(key)?;
        entry.touch();
        Some(Arc::clone(&entry.page))
    }

    fn admit(&mut self, key: &str, fetched: Result<SourcePage>) -> Result<Arc<Page>> {
        match fetched {
            Ok(SourcePage::Missing) => {
                log::warn!("'{key}' cannot be found (anymore)");
                Err(PageStoreError::NotFound(key.to_string()))
            }
            Ok(SourcePage::Found { text, links }) => {
                // Another name may have resolved to this page in the meantime.
                if let Some(page) = self.bump(key) {
                    return Ok(page);
                }
                let links = links
                    .iter()
                    .map(|link| canonical_name(link))
                    .filter(|link| !link.is_empty())
                    .collect();
                let page = Page::new(key, self.normalizer.normalize(&text), links);
                let entry = CacheEntry::fresh(page);
                let page = Arc::clone(&entry.page);
                self.entries.insert(key.to_string(), entry);
                Ok(page)
            }
            Err(err) => {
                log::warn!("{err}");
                Err(err)
            }
        }
    }

    pub fn entry(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(&canonical_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&canonical_name(name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn fetch_one(source: &dyn PageSource, key: &str, timeout: Duration) -> Result<SourcePage> {
    match tokio::time::timeout(timeout, source.fetch(key)).await {
        Ok(Ok(page)) => Ok(page),
        Ok(Err(source)) => Err(PageStoreError::Source {
            name: key.to_string(),
            source,
        }),
        Err(_) => Err(PageStoreError::Timeout {
            name: key.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}
