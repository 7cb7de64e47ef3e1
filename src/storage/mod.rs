//! Storage module for persisting domain records
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Domain record lookup, insertion and full-record updates
//! - Selection of unprocessed domains for the scheduler
//! - Paginated, filtered reads for browsing the collected fingerprints

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DomainStore, StoreError, StoreResult};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A store shared between the scheduler and its workers
///
/// Every operation takes the lock for exactly one store call; the lock is
/// never held across an `.await`.
pub type SharedStore = Arc<Mutex<dyn DomainStore + Send>>;

/// Opens the SQLite store at `path` and wraps it for sharing
pub fn open_shared_store(path: &Path) -> StoreResult<SharedStore> {
    let store = SqliteStore::new(path)?;
    Ok(Arc::new(Mutex::new(store)))
}

/// Locks a shared store
pub fn lock_store(store: &SharedStore) -> StoreResult<MutexGuard<'_, dyn DomainStore + Send + 'static>> {
    store.lock().map_err(|_| StoreError::Poisoned)
}

/// Selects which domains a browsing query returns
///
/// Pattern arguments are regular expressions matched anywhere in the text,
/// the same way the browsing site matches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFilter {
    /// Every domain
    All,

    /// Domains with a recorded fetch that were not skipped
    Checked,

    /// Domains that were ignored or failed
    Skipped,

    /// Domains that have never been attempted
    Unprocessed,

    /// Domains whose name matches the pattern
    NameMatches(String),

    /// Domains with any header value matching the pattern
    HeaderValueMatches(String),

    /// Domains with a header of the given key (case-insensitive) whose value matches
    HeaderMatches { key: String, value: String },
}

impl DomainFilter {
    /// Returns the regular expressions this filter will evaluate
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::NameMatches(pattern) | Self::HeaderValueMatches(pattern) => vec![pattern],
            Self::HeaderMatches { value, .. } => vec![value],
            _ => Vec::new(),
        }
    }
}
