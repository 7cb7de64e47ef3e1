//! Output module for browsing collected fingerprints
//!
//! This module handles:
//! - The catalog of named header fingerprints
//! - Paginated listings, name search, random picks and discovery chains
//! - Store statistics

mod fingerprint;
mod listing;
pub mod stats;

pub use fingerprint::{find_fingerprint, Fingerprint, FingerprintTarget, FINGERPRINTS};
pub use listing::{
    list_domains, parent_chain, print_domain_detail, print_domain_page, random_domain, search_domains,
    DomainPage, RESULTS_PER_PAGE,
};
pub use stats::{format_count, load_statistics, print_statistics, DomainStatistics};
