use crate::data::{Article, ArticleStore, ArticleStoreError, GetOpts, ItemId, LinkProbe, LinkStatus};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 4;

/// Errors that abort a sweep
#[derive(Debug)]
pub enum SweepError {
    /// A sweep needs at least one worker
    NoWorkers,
    /// The favorites list could not be retrieved
    FetchList(ArticleStoreError),
    /// A link-check worker died before draining its share of the queue
    WorkerPanicked(String),
    /// The bulk delete of dead links failed
    Delete {
        item_ids: Vec<ItemId>,
        source: ArticleStoreError,
    },
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SweepError::NoWorkers => write!(f, "Sweep requires at least one worker"),
            SweepError::FetchList(e) => write!(f, "Failed to fetch favorites: {}", e),
            SweepError::WorkerPanicked(details) => {
                write!(f, "Link check worker failed: {}", details)
            }
            SweepError::Delete { item_ids, source } => {
                write!(f, "Failed to delete {} dead link(s): {}", item_ids.len(), source)
            }
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::FetchList(e) => Some(e),
            SweepError::Delete { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Outcome of one completed sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Articles probed by each worker, indexed by worker number
    pub processed_per_worker: Vec<usize>,
    /// Item ids whose link failed its probe; all of them were passed to the bulk delete
    pub dead: Vec<ItemId>,
    /// Articles excluded by the skip list
    pub skipped: usize,
    /// Whether the shutdown signal stopped the feed early
    pub cancelled: bool,
}

impl SweepReport {
    pub fn total_processed(&self) -> usize {
        self.processed_per_worker.iter().sum()
    }

    pub fn deleted(&self) -> usize {
        self.dead.len()
    }
}

/// Dead Link Sweep context: fetches the favorites snapshot, probes every link
/// across a fixed pool of workers and bulk-deletes the ones that fail.
///
/// Each pass attempts every external call exactly once. The only recovery from
/// a failed pass is running another one.
pub struct DeadLinkSweep<S, P> {
    store: S,
    probe: Arc<P>,
    workers: usize,
    skip: HashSet<ItemId>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<S, P> DeadLinkSweep<S, P>
where
    S: ArticleStore,
    P: LinkProbe,
{
    /// Creates a new sweep
    ///
    /// # Arguments
    /// * `store` - Where favorites come from and dead links are deleted
    /// * `probe` - Liveness check applied to each article's resolved url
    /// * `workers` - Number of concurrent link checkers, at least 1
    pub fn new(store: S, probe: P, workers: usize) -> Result<Self, SweepError> {
        if workers == 0 {
            return Err(SweepError::NoWorkers);
        }

        Ok(Self {
            store,
            probe: Arc::new(probe),
            workers,
            skip: HashSet::new(),
            shutdown: None,
        })
    }

    /// Excludes these item ids from the pass: they are neither probed nor deleted
    pub fn with_skip_list(mut self, item_ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.skip.extend(item_ids);
        self
    }

    /// Stops feeding new work once the receiver observes `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Runs one complete pass
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        let favorites = self
            .store
            .fetch(&GetOpts::favorited())
            .await
            .map_err(|e| {
                error!(error = %e, "fetching favorites failed");
                SweepError::FetchList(e)
            })?;
        info!(articles = favorites.len(), workers = self.workers, "starting dead link sweep");

        let (work_tx, work_rx) = mpsc::channel::<Article>(1);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (dead_tx, mut dead_rx) = mpsc::unbounded_channel::<ItemId>();

        let collector = tokio::spawn(async move {
            let mut dead = Vec::new();
            while let Some(item_id) = dead_rx.recv().await {
                dead.push(item_id);
            }
            dead
        });

        let mut workers = JoinSet::new();
        for worker in 0..self.workers {
            workers.spawn(check_links(
                worker,
                Arc::clone(&work_rx),
                dead_tx.clone(),
                Arc::clone(&self.probe),
            ));
        }
        drop(dead_tx);

        let outcome = feed(
            favorites.into_values(),
            &self.skip,
            work_tx,
            self.shutdown.clone(),
        )
        .await;

        let mut processed_per_worker = vec![0; self.workers];
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((worker, processed)) => processed_per_worker[worker] = processed,
                Err(e) => {
                    error!(error = %e, "link check worker failed");
                    return Err(SweepError::WorkerPanicked(e.to_string()));
                }
            }
        }

        let dead = collector
            .await
            .map_err(|e| SweepError::WorkerPanicked(e.to_string()))?;

        if outcome.cancelled {
            warn!(dead = dead.len(), "sweep cancelled, deleting partial results");
        }
        info!(count = dead.len(), item_ids = ?dead, "deleting dead links");

        if let Err(source) = self.store.delete(&dead).await {
            error!(error = %source, "bulk delete failed");
            return Err(SweepError::Delete {
                item_ids: dead,
                source,
            });
        }

        Ok(SweepReport {
            processed_per_worker,
            dead,
            skipped: outcome.skipped,
            cancelled: outcome.cancelled,
        })
    }
}

#[derive(Debug, Default)]
struct FeedOutcome {
    skipped: usize,
    cancelled: bool,
}

/// Single producer: pushes every non-skipped article onto the work queue, then
/// closes it by dropping the sender.
async fn feed(
    articles: impl Iterator<Item = Article>,
    skip: &HashSet<ItemId>,
    work_tx: mpsc::Sender<Article>,
    mut shutdown: Option<watch::Receiver<bool>>,
) -> FeedOutcome {
    let mut outcome = FeedOutcome::default();

    for article in articles {
        if skip.contains(&article.item_id) {
            debug!(item_id = %article.item_id, "skipping excluded article");
            outcome.skipped += 1;
            continue;
        }

        let sent = match shutdown.as_mut() {
            Some(shutdown) => tokio::select! {
                biased;
                Ok(_) = shutdown.wait_for(|stop| *stop) => None,
                sent = work_tx.send(article) => Some(sent),
            },
            None => Some(work_tx.send(article).await),
        };

        match sent {
            Some(Ok(())) => {}
            Some(Err(_)) => {
                warn!("all link check workers exited early");
                break;
            }
            None => {
                info!("shutdown requested, no further links will be queued");
                outcome.cancelled = true;
                break;
            }
        }
    }

    outcome
}

/// Worker loop: pulls from the shared queue until it is closed and drained.
///
/// Returns the worker number and how many articles it processed.
async fn check_links<P: LinkProbe>(
    worker: usize,
    work_rx: Arc<Mutex<mpsc::Receiver<Article>>>,
    dead_tx: mpsc::UnboundedSender<ItemId>,
    probe: Arc<P>,
) -> (usize, usize) {
    let mut processed = 0;

    loop {
        let next = work_rx.lock().await.recv().await;
        let Some(article) = next else {
            break;
        };
        processed += 1;

        info!(worker, item_id = %article.item_id, url = %article.resolved_url, "checking link");
        match probe.probe(&article.resolved_url).await {
            LinkStatus::Alive => {
                debug!(worker, item_id = %article.item_id, "link alive");
            }
            LinkStatus::Dead(reason) => {
                warn!(
                    worker,
                    item_id = %article.item_id,
                    url = %article.resolved_url,
                    %reason,
                    "check link failed"
                );
                // The collector outlives every worker.
                let _ = dead_tx.send(article.item_id);
            }
        }
    }

    debug!(worker, processed, "link check worker finished");
    (worker, processed)
}
