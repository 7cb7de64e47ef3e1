//! Crawler module for domain discovery and fingerprinting
//!
//! This module contains the core crawling logic, including:
//! - Front-page fetching and header capture
//! - HTML parsing and link-to-domain extraction
//! - Bounded-concurrency batch scheduling
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, seed_domains, Coordinator};
pub use fetcher::{
    build_http_client, canonical_header_key, capture_headers, is_resource_exhaustion,
    DomainFetcher, FetchOutcome, FetchSettings, SkipReason,
};
pub use parser::{extract_domains, extract_domains_from_response};
pub use scheduler::{BatchReport, CrawlReport, Scheduler};

use crate::config::Config;
use crate::GenomeError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Open the domain store and insert missing seeds
/// 3. Build the HTTP client
/// 4. Fetch batches of unprocessed domains until none remain
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `verbose` - Log per-domain progress
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran out of work
/// * `Err(GenomeError)` - Startup failed or a domain could not be written back
pub async fn crawl(config: Config, verbose: bool) -> Result<CrawlReport, GenomeError> {
    run_crawl(config, verbose).await
}
