//! Statistics generation from the domain store
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{DomainFilter, DomainStore, StoreResult};

/// Domain counts by lifecycle status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainStatistics {
    /// Every stored domain
    pub total: u64,

    /// Fetched and answered
    pub checked: u64,

    /// Ignored or failed
    pub skipped: u64,

    /// Waiting for a first attempt
    pub unprocessed: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(DomainStatistics)` - Successfully loaded statistics
/// * `Err(StoreError)` - Failed to query statistics
pub fn load_statistics(store: &dyn DomainStore) -> StoreResult<DomainStatistics> {
    Ok(DomainStatistics {
        total: store.count(&DomainFilter::All)?,
        checked: store.count(&DomainFilter::Checked)?,
        skipped: store.count(&DomainFilter::Skipped)?,
        unprocessed: store.count(&DomainFilter::Unprocessed)?,
    })
}

/// Formats a count with comma thousands separators, e.g. `1,234,567`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DomainStatistics) {
    println!("=== Domain Statistics ===\n");
    println!("  Total domains: {}", format_count(stats.total));

    for (label, count) in [
        ("Checked", stats.checked),
        ("Skipped", stats.skipped),
        ("Unprocessed", stats.unprocessed),
    ] {
        let percentage = if stats.total > 0 {
            (count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, format_count(count), percentage);
    }
}
