//! Batch scheduler
//!
//! The scheduler pulls unprocessed domains from the store in batches and
//! runs one fetch task per domain, never more than `max_workers` at once.
//! A batch is fully drained before the next one is selected, so a domain
//! discovered mid-batch waits for a later batch.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{DomainFetcher, FetchOutcome};
use crate::storage::{lock_store, SharedStore};
use crate::GenomeError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Counts for one drained batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Domains handed to workers
    pub dispatched: usize,

    /// Domains whose front page answered
    pub succeeded: usize,

    /// Domains marked skipped
    pub skipped: usize,

    /// New domains inserted from links
    pub discovered: usize,

    /// Most workers observed in flight at once
    pub peak_in_flight: usize,

    /// Wall time from selection to drain
    pub elapsed: Duration,
}

impl BatchReport {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success { discovered, .. } => {
                self.succeeded += 1;
                self.discovered += discovered;
            }
            FetchOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Totals for a whole crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub batches: usize,
    pub domains: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub discovered: usize,
    pub peak_in_flight: usize,
}

impl CrawlReport {
    fn absorb(&mut self, batch: &BatchReport) {
        self.batches += 1;
        self.domains += batch.dispatched;
        self.succeeded += batch.succeeded;
        self.skipped += batch.skipped;
        self.discovered += batch.discovered;
        self.peak_in_flight = self.peak_in_flight.max(batch.peak_in_flight);
    }
}

/// Tracks one running worker in the shared in-flight counters
struct InFlight {
    current: Arc<AtomicUsize>,
}

impl InFlight {
    fn enter(current: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            current: Arc::clone(current),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs fetch workers over batches of unprocessed domains
pub struct Scheduler {
    store: SharedStore,
    fetcher: Arc<DomainFetcher>,

    /// Caps concurrent workers; a permit lives as long as its worker
    semaphore: Arc<Semaphore>,

    batch_size: usize,

    /// Domains dispatched since the scheduler was created
    total_dispatched: u64,
}

impl Scheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `store` - The shared domain store
    /// * `fetcher` - The fetcher every worker uses
    /// * `config` - Supplies `batch_size` and `max_workers`, both validated positive
    pub fn new(store: SharedStore, fetcher: Arc<DomainFetcher>, config: &CrawlerConfig) -> Self {
        Self {
            store,
            fetcher,
            semaphore: Arc::new(Semaphore::new(config.max_workers as usize)),
            batch_size: config.batch_size as usize,
            total_dispatched: 0,
        }
    }

    /// Returns how many domains have been dispatched so far
    pub fn total_dispatched(&self) -> u64 {
        self.total_dispatched
    }

    /// Runs batches until no unprocessed domain is left
    pub async fn run(&mut self) -> Result<CrawlReport, GenomeError> {
        let mut report = CrawlReport::default();

        while let Some(batch) = self.run_batch().await? {
            report.absorb(&batch);
        }

        tracing::info!("No domains found to check, crawl complete");
        Ok(report)
    }

    /// Selects and fully processes one batch
    ///
    /// # Returns
    ///
    /// * `Ok(Some(BatchReport))` - A batch was run and drained
    /// * `Ok(None)` - Nothing is left to process
    /// * `Err(GenomeError)` - A worker could not write its domain back; the
    ///   rest of the batch was still drained
    pub async fn run_batch(&mut self) -> Result<Option<BatchReport>, GenomeError> {
        let start = Instant::now();

        let batch = {
            let store = lock_store(&self.store)?;
            store.find_unprocessed(self.batch_size)?
        };

        if batch.is_empty() {
            return Ok(None);
        }

        tracing::debug!("Selected batch of {} domains", batch.len());

        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();
        let mut report = BatchReport::default();

        for domain in batch {
            // Waits here while max_workers are in flight
            let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

            self.total_dispatched += 1;
            report.dispatched += 1;
            tracing::info!("Checking {}", domain.name);

            let fetcher = Arc::clone(&self.fetcher);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);

            workers.spawn(async move {
                let _in_flight = InFlight::enter(&current, &peak);
                let _permit = permit;
                fetcher.process(domain).await
            });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(outcome)) => report.record(&outcome),
                Ok(Err(e)) => {
                    tracing::error!("Worker failed: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Worker task panicked or was cancelled: {}", e);
                    first_error.get_or_insert(GenomeError::Worker(e));
                }
            }
        }

        report.peak_in_flight = peak.load(Ordering::SeqCst);
        report.elapsed = start.elapsed();

        tracing::info!(
            "Completed {} domains in {:.2} seconds",
            report.dispatched,
            report.elapsed.as_secs_f64()
        );
        tracing::info!("Total run count: {}", self.total_dispatched);

        match first_error {
            Some(e) => Err(e),
            None => Ok(Some(report)),
        }
    }
}
