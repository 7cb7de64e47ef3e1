//! Crawler coordinator - wires the store, fetcher and scheduler together
//!
//! This module owns crawl startup:
//! - Validating the configuration
//! - Opening the store and inserting missing seeds
//! - Building the shared fetcher
//! - Handing control to the scheduler until no work is left

use crate::config::{validate, Config};
use crate::crawler::fetcher::{DomainFetcher, FetchSettings};
use crate::crawler::scheduler::{CrawlReport, Scheduler};
use crate::state::Domain;
use crate::storage::{lock_store, open_shared_store, DomainStore, SharedStore, StoreError};
use crate::GenomeError;
use std::path::Path;
use std::sync::Arc;

/// Inserts each seed that is not already stored
///
/// Returns how many seeds were new. Seeds already present, whatever their
/// status, are left untouched, so re-running never resets a domain.
pub fn seed_domains(store: &mut dyn DomainStore, seeds: &[String]) -> Result<usize, StoreError> {
    let mut inserted = 0;

    for name in seeds {
        if store.find_by_name(name)?.is_some() {
            continue;
        }

        match store.insert(&Domain::seed(name.as_str())) {
            Ok(_) => inserted += 1,
            Err(StoreError::DuplicateName(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(inserted)
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Creates a coordinator over the database named in the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `verbose` - Log per-domain progress
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Store opened and seeded
    /// * `Err(GenomeError)` - Invalid configuration or unusable store
    pub fn new(config: Config, verbose: bool) -> Result<Self, GenomeError> {
        validate(&config)?;
        let store = open_shared_store(Path::new(&config.store.database_path))?;
        Self::assemble(config, store, verbose)
    }

    /// Creates a coordinator over an already opened store
    pub fn with_store(config: Config, store: SharedStore, verbose: bool) -> Result<Self, GenomeError> {
        validate(&config)?;
        Self::assemble(config, store, verbose)
    }

    /// Seeds the store and builds the fetcher and scheduler for a validated config
    fn assemble(config: Config, store: SharedStore, verbose: bool) -> Result<Self, GenomeError> {
        let seeded = {
            let mut guard = lock_store(&store)?;
            seed_domains(&mut *guard, &config.domains.seeds)?
        };
        if seeded > 0 {
            tracing::info!("Inserted {} seed domains", seeded);
        }

        let settings = FetchSettings::from_config(&config, verbose);
        let fetcher = Arc::new(DomainFetcher::new(store.clone(), settings)?);
        let scheduler = Scheduler::new(store, fetcher, &config.crawler);

        Ok(Self {
            config: Arc::new(config),
            scheduler,
        })
    }

    /// Runs the crawl until no unprocessed domain is left
    pub async fn run(&mut self) -> Result<CrawlReport, GenomeError> {
        tracing::info!(
            "Starting crawl: batch size {}, max workers {}, timeout {}s",
            self.config.crawler.batch_size,
            self.config.crawler.max_workers,
            self.config.crawler.http_timeout
        );

        let start_time = std::time::Instant::now();
        let report = self.scheduler.run().await?;

        tracing::info!(
            "Crawl finished: {} domains in {} batches ({} answered, {} skipped, {} discovered) in {:.2}s",
            report.domains,
            report.batches,
            report.succeeded,
            report.skipped,
            report.discovered,
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Example
///
/// ```no_run
/// use webgenome::config::load_config;
/// use webgenome::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("webgenome.toml"))?;
/// let report = run_crawl(config, false).await?;
/// println!("Checked {} domains", report.domains);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, verbose: bool) -> Result<CrawlReport, GenomeError> {
    let mut coordinator = Coordinator::new(config, verbose)?;
    coordinator.run().await
}
