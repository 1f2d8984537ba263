use anyhow::{Context, Result, anyhow, bail};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

mod summary;

use pocket_pick::clients::{DryRun, HttpProbe, MemoryStore, PocketApi};
use pocket_pick::config::{Settings, parse_id_list};
use pocket_pick::contexts::{DeadLinkSweep, ExpiringCache, FavoritePicker, SweepReport};
use pocket_pick::data::{ArticleStore, GetOpts, ItemId};
use summary::print_sweep_summary;

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
}

/// Command line overrides for a sweep
pub struct SweepOptions {
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
    pub skip: Vec<String>,
}

pub async fn check_dead_link(options: SweepOptions, config: &Config) -> Result<()> {
    let settings = Settings::from_env()?;

    let workers = options.workers.unwrap_or(settings.workers);
    let timeout = options
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(settings.probe_timeout);
    let mut skip = settings.skip.clone();
    for ids in &options.skip {
        skip.extend(parse_id_list(ids));
    }

    let api = PocketApi::new(&settings.api_url, &settings.consumer_key, &settings.access_token);
    let probe = HttpProbe::new(timeout).context("Failed to build HTTP client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if forward_interrupts(tokio::signal::ctrl_c, shutdown_tx).await {
            std::process::exit(130);
        }
    });

    let start = Instant::now();
    let report = if config.dry_run {
        run_sweep(DryRun::new(api), probe, workers, skip, shutdown_rx).await?
    } else {
        run_sweep(api, probe, workers, skip, shutdown_rx).await?
    };

    print_sweep_summary(&report, start.elapsed(), config);
    Ok(())
}

/// First interrupt asks the sweep to stop; a second one means give up now.
///
/// Returns true once the second interrupt arrives, false if listening fails.
async fn forward_interrupts<F, Fut>(mut interrupt: F, shutdown_tx: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    warn!("Interrupt received, finishing in-flight checks (press Ctrl-C again to quit)");
    let _ = shutdown_tx.send(true);

    if interrupt().await.is_err() {
        return false;
    }
    warn!("Second interrupt received, exiting");
    true
}

async fn run_sweep<S: ArticleStore>(
    store: S,
    probe: HttpProbe,
    workers: usize,
    skip: Vec<ItemId>,
    shutdown: watch::Receiver<bool>,
) -> Result<SweepReport> {
    let sweep = DeadLinkSweep::new(store, probe, workers)?
        .with_skip_list(skip)
        .with_shutdown(shutdown);

    let report = sweep.run().await.context("Dead link sweep failed")?;
    Ok(report)
}

/// A delete argument: either an article url or a numeric item id
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Url(String),
    Id(ItemId),
}

fn parse_target(arg: &str) -> Result<Target> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        return Ok(Target::Url(arg.to_string()));
    }

    if arg.parse::<u64>().is_err() {
        bail!("{} is not valid id", arg);
    }
    Ok(Target::Id(ItemId::new(arg)))
}

pub async fn delete(targets: Vec<String>, config: &Config) -> Result<()> {
    let settings = Settings::from_env()?;
    let api = PocketApi::new(&settings.api_url, &settings.consumer_key, &settings.access_token);

    if config.dry_run {
        delete_targets(&DryRun::new(api), &targets).await
    } else {
        delete_targets(&api, &targets).await
    }
}

async fn delete_targets<S: ArticleStore>(store: &S, targets: &[String]) -> Result<()> {
    for arg in targets {
        let item_id = match parse_target(arg)? {
            Target::Id(item_id) => item_id,
            Target::Url(url) => resolve_url(store, &url).await?,
        };

        info!(item_id = %item_id, "deleting item");
        store
            .delete(std::slice::from_ref(&item_id))
            .await
            .with_context(|| format!("delete failed item: {}", item_id))?;
        println!("Deleted {}", item_id);
    }

    Ok(())
}

/// Find the single article saved under `url`
async fn resolve_url<S: ArticleStore>(store: &S, url: &str) -> Result<ItemId> {
    let items = store
        .fetch(&GetOpts::search(url))
        .await
        .with_context(|| format!("search failed: {}", url))?;

    let mut matches = items.into_values();
    match (matches.next(), matches.next()) {
        (Some(article), None) => {
            info!(item_id = %article.item_id, url = %article.resolved_url, "resolved url");
            Ok(article.item_id)
        }
        (None, _) => Err(anyhow!("not found: {}", url)),
        (Some(_), Some(_)) => Err(anyhow!("ambiguous, more than one article matches: {}", url)),
    }
}

pub async fn pick(config: &Config) -> Result<()> {
    let settings = Settings::from_env()?;
    let api = PocketApi::new(&settings.api_url, &settings.consumer_key, &settings.access_token);
    // Lives for one run, so a single pick always misses. Hosts that keep the
    // picker around serve repeat picks from it until the TTL lapses.
    let cache = ExpiringCache::new(MemoryStore::default());
    let picker = FavoritePicker::new(api, cache, &settings.access_token, settings.cache_ttl);

    let article = picker
        .pick(&mut rand::thread_rng())
        .await
        .context("get favorite articles failed")?;

    if config.verbose {
        println!("{} ({})", article.resolved_title, article.resolved_url);
    }
    println!("{}", article.read_url());
    Ok(())
}

pub fn version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
