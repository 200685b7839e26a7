use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use progress::ProgressObserver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use report::{render_route, RouteReport};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wiki::{OfflineSource, WikiSource};
use wikipath_page_store::{CacheBackend, PageRepository, PageSource, RepositoryConfig};
use wikipath_search::{CancelFlag, PathSearch, SearchConfig, DEFAULT_MAX_DOWNLOAD};
use wikipath_text::Normalizer;

mod progress;
mod report;
mod wiki;

/// Exit status for a run ended by a repeated interrupt.
const EXIT_INTERRUPTED: i32 = 130;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "wikipath")]
#[command(
    about = "Find a route between two Wikipedia articles by following links",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Article to start from
    #[arg(long, default_value = "Love")]
    start: String,

    /// Article to reach
    #[arg(long, default_value = "Apple")]
    end: String,

    /// Page cache location (a directory for the sharded backend)
    #[arg(long, default_value = "pagecache.json")]
    cache_file: PathBuf,

    /// Cache backend: file|sharded|memory
    #[arg(long, default_value = "file")]
    cache_backend: CacheBackend,

    /// Links sampled and downloaded per hop
    #[arg(long, default_value_t = DEFAULT_MAX_DOWNLOAD)]
    max_download: usize,

    /// Wikipedia language edition (stopwords are only removed for `en`)
    #[arg(long, default_value = "en")]
    language: String,

    /// Concurrent page downloads per hop
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Per-page download timeout in seconds
    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Give up after this many hops
    #[arg(long)]
    max_hops: Option<usize>,

    /// Seed for link sampling, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Use only cached pages; never contact Wikipedia
    #[arg(long)]
    offline: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,

    /// Print the route as JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest's connection chatter is only useful when debugging the network layer
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let fetch_timeout = Duration::from_secs(cli.fetch_timeout_secs.max(1));
    let source: Arc<dyn PageSource> = if cli.offline {
        Arc::new(OfflineSource)
    } else {
        Arc::new(WikiSource::new(&cli.language, fetch_timeout)?)
    };

    let mut repo = PageRepository::new(
        source,
        RepositoryConfig {
            path: cli.cache_file.clone(),
            backend: cli.cache_backend,
            fetch_concurrency: cli.concurrency.max(1),
            fetch_timeout,
        },
    )
    .with_normalizer(Normalizer::for_language(&cli.language));
    let cache_path = repo.config().path.clone();
    let loaded = repo
        .load()
        .await
        .with_context(|| format!("Failed to load page cache {}", cache_path.display()))?;
    log::info!("Page cache: {loaded} pages");

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut interrupts = 0usize;
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupts += 1;
                if interrupts == 1 {
                    log::warn!("Interrupted; abandoning the current hop (again to exit now)");
                    cancel.cancel();
                } else {
                    log::warn!("Interrupted again; exiting without saving the page cache");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        });
    }

    let config = SearchConfig {
        max_download: cli.max_download,
        max_hops: cli.max_hops,
    };
    let mut observer = ProgressObserver::new(!cli.quiet && !cli.json);
    let mut search = PathSearch::new(&mut repo, config, rng).with_cancel(cancel);
    let result = search.run(&cli.start, &cli.end, &mut observer).await;
    log::debug!("Search stopped after {} hops", search.hops());
    drop(search);

    match repo.save().await {
        Ok(report) => log::info!("Saved {} cached pages", report.written),
        Err(err) => log::warn!("Saving the page cache failed: {err}"),
    }

    let outcome =
        result.with_context(|| format!("No route from '{}' to '{}'", cli.start, cli.end))?;
    if cli.json {
        let mut json = RouteReport::new(&outcome, &cli.language).to_json()?;
        json.push('\n');
        print_stdout(&json)
    } else {
        print_stdout(&render_route(&outcome.route, &cli.language))
    }
}
