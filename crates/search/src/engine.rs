use crate::error::{Result, SearchError};
use crate::ranker::SimilarityRanker;
use crate::sampling::sample_frontier;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use wikipath_page_store::{Page, PageRepository, PageStoreError};
use wikipath_text::canonical_name;

pub const DEFAULT_MAX_DOWNLOAD: usize = 150;

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Links sampled and fetched per hop.
    pub max_download: usize,
    /// Frontier expansions allowed before giving up. `None` is unbounded.
    pub max_hops: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_download: DEFAULT_MAX_DOWNLOAD,
            max_hops: None,
        }
    }
}

/// Where the search currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    FetchFrontier,
    Rank,
    Select,
    Found,
    Exhausted,
}

/// Result of one [`PathSearch::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    /// The target was appended to the route.
    Found,
    /// The named page became the current page.
    Advanced(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub route: Vec<String>,
    /// Frontier expansions performed.
    pub hops: usize,
    /// Frontier pages successfully fetched across all hops.
    pub pages_fetched: usize,
}

/// Cooperative cancellation.
///
/// Checked before every hop. A hop whose frontier is still downloading is
/// abandoned as soon as the flag is tripped.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<CancelState>);

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelFlag::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Progress callbacks. Every method defaults to doing nothing.
pub trait SearchObserver {
    fn frontier_started(&mut self, _page: &str, _sampled: usize, _total_links: usize) {}
    fn page_fetched(&mut self, _name: &str) {}
    fn frontier_finished(&mut self) {}
    fn hop_committed(&mut self, _route: &[String]) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Greedy walk from a start page towards a target page.
///
/// Each hop samples the current page's links, ranks the fetched pages by
/// textual distance to the target and moves to the closest page not yet on
/// the route. There is no backtracking: a hop with no unvisited candidate
/// ends the search with [`SearchError::Exhausted`].
pub struct PathSearch<'a> {
    repo: &'a mut PageRepository,
    ranker: SimilarityRanker,
    config: SearchConfig,
    rng: StdRng,
    cancel: CancelFlag,
    state: SearchState,
    route: Vec<String>,
    visited: HashSet<String>,
    current: Option<Arc<Page>>,
    target: Option<Arc<Page>>,
    hops: usize,
    pages_fetched: usize,
}

impl<'a> PathSearch<'a> {
    pub fn new(repo: &'a mut PageRepository, config: SearchConfig, rng: StdRng) -> Self {
        Self {
            repo,
            ranker: SimilarityRanker::new(),
            config,
            rng,
            cancel: CancelFlag::new(),
            state: SearchState::Init,
            route: Vec::new(),
            visited: HashSet::new(),
            current: None,
            target: None,
            hops: 0,
            pages_fetched: 0,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn route(&self) -> &[String] {
        &self.route
    }

    pub fn hops(&self) -> usize {
        self.hops
    }

    /// Run from `start` to `target` until the target is linked or the search
    /// fails.
    pub async fn run(
        &mut self,
        start: &str,
        target: &str,
        observer: &mut dyn SearchObserver,
    ) -> Result<SearchOutcome> {
        self.begin(start, target).await?;
        loop {
            if self.step(observer).await? == HopOutcome::Found {
                return Ok(SearchOutcome {
                    route: self.route.clone(),
                    hops: self.hops,
                    pages_fetched: self.pages_fetched,
                });
            }
        }
    }

    /// Fetch the target and start pages and reset the route to `[start]`.
    pub async fn begin(&mut self, start: &str, target: &str) -> Result<()> {
        let target_page = match self.repo.get(target).await {
            Ok(page) => page,
            Err(PageStoreError::NotFound(_)) => {
                return Err(SearchError::TargetNotFound(canonical_name(target)))
            }
            Err(err) => return Err(err.into()),
        };
        let start_page = match self.repo.get(start).await {
            Ok(page) => page,
            Err(PageStoreError::NotFound(_)) => {
                return Err(SearchError::StartNotFound(canonical_name(start)))
            }
            Err(err) => return Err(err.into()),
        };
        self.persist().await;

        log::info!("Searching a route from '{}' to '{}'", start_page.name, target_page.name);
        self.route = vec![start_page.name.clone()];
        self.visited = HashSet::from([start_page.name.clone()]);
        self.current = Some(start_page);
        self.target = Some(target_page);
        self.hops = 0;
        self.pages_fetched = 0;
        self.state = SearchState::FetchFrontier;
        Ok(())
    }

    /// Perform one iteration: direct-hit check, then at most one hop.
    pub async fn step(&mut self, observer: &mut dyn SearchObserver) -> Result<HopOutcome> {
        let (Some(current), Some(target)) = (self.current.clone(), self.target.clone()) else {
            return Err(SearchError::NotStarted);
        };
        match self.state {
            SearchState::Found => return Ok(HopOutcome::Found),
            SearchState::Exhausted => return Err(self.exhausted(&current)),
            _ => {}
        }

        if current.name == target.name || current.links_to(&target.name) {
            if current.name != target.name {
                self.route.push(target.name.clone());
            }
            self.state = SearchState::Found;
            log::info!("Found '{}' after {} hops", target.name, self.hops);
            return Ok(HopOutcome::Found);
        }

        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if let Some(max_hops) = self.config.max_hops {
            if self.hops >= max_hops {
                return Err(SearchError::HopLimit(max_hops));
            }
        }

        self.state = SearchState::FetchFrontier;
        let frontier = self.fetch_frontier(&current, observer).await?;
        self.hops += 1;

        self.state = SearchState::Rank;
        let ranked = self.ranker.rank(&frontier, &target);
        log::debug!(
            "Hop {}: {} of {} frontier pages ranked",
            self.hops,
            ranked.len(),
            frontier.len()
        );

        self.state = SearchState::Select;
        let Some(next) = ranked
            .into_iter()
            .find(|candidate| !self.visited.contains(&candidate.page.name))
        else {
            self.state = SearchState::Exhausted;
            return Err(self.exhausted(&current));
        };

        log::info!(
            "Hop {}: '{}' -> '{}' (distance {:.4})",
            self.hops,
            current.name,
            next.page.name,
            next.distance
        );
        let name = next.page.name.clone();
        self.route.push(name.clone());
        self.visited.insert(name.clone());
        self.current = Some(next.page);
        self.state = SearchState::FetchFrontier;
        self.persist().await;
        observer.hop_committed(&self.route);

        Ok(HopOutcome::Advanced(name))
    }

    async fn fetch_frontier(
        &mut self,
        current: &Page,
        observer: &mut dyn SearchObserver,
    ) -> Result<Vec<Arc<Page>>> {
        let sample = sample_frontier(&current.links, self.config.max_download, &mut self.rng);
        log::info!(
            "Download pages ({}/{}) linked from '{}'",
            sample.len(),
            current.links.len(),
            current.name
        );
        observer.frontier_started(&current.name, sample.len(), current.links.len());

        let cancel = self.cancel.clone();
        let downloads = self.repo.get_many(&sample, |name| observer.page_fetched(name));
        let fetched = tokio::select! {
            results = downloads => Some(results),
            _ = cancel.cancelled() => None,
        };
        observer.frontier_finished();
        let Some(results) = fetched else {
            log::warn!("Abandoning the hop from '{}': search cancelled", current.name);
            return Err(SearchError::Cancelled);
        };

        let mut frontier = Vec::with_capacity(results.len());
        for (name, result) in results {
            match result {
                Ok(page) => frontier.push(page),
                Err(PageStoreError::NotFound(_)) => {
                    log::debug!("'{name}' linked from '{}' does not exist", current.name)
                }
                Err(err) => log::debug!("Skipping '{name}' this hop: {err}"),
            }
        }
        self.pages_fetched += frontier.len();
        Ok(frontier)
    }

    async fn persist(&mut self) {
        if let Err(err) = self.repo.save().await {
            log::warn!("Saving the page cache failed: {err}");
        }
    }

    fn exhausted(&self, current: &Page) -> SearchError {
        SearchError::Exhausted {
            at: current.name.clone(),
            hops: self.hops,
        }
    }
}
