use indicatif::{ProgressBar, ProgressStyle};
use wikipath_search::SearchObserver;

/// Draws a per-hop download bar on stderr.
pub struct ProgressObserver {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }
}

impl SearchObserver for ProgressObserver {
    fn frontier_started(&mut self, page: &str, sampled: usize, _total_links: usize) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(sampled as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len} ({elapsed})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(format!("links of '{page}'"));
        self.bar = Some(bar);
    }

    fn page_fetched(&mut self, _name: &str) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn frontier_finished(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn hop_committed(&mut self, route: &[String]) {
        if let Some(current) = route.last() {
            log::info!("Current page: {current}");
        }
    }
}
