//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{Domain, DomainId};
use crate::storage::DomainFilter;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Domain not found: {0}")]
    DomainNotFound(DomainId),

    #[error("Domain already exists: {0}")]
    DuplicateName(String),

    #[error("Domain record has no id: {0}")]
    MissingId(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for domain store implementations
///
/// Each method is a single-document operation; the crawler places no locking
/// or transactions on top beyond serializing calls.
pub trait DomainStore {
    // ===== Crawl Queries =====

    /// Returns up to `limit` domains that have never been attempted
    ///
    /// Order is store-defined.
    fn find_unprocessed(&self, limit: usize) -> StoreResult<Vec<Domain>>;

    /// Looks up a domain by name
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Domain))` - The domain exists
    /// * `Ok(None)` - No domain has this name
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Domain>>;

    /// Gets a domain by id
    fn find_by_id(&self, id: DomainId) -> StoreResult<Domain>;

    /// Inserts a new domain and returns its assigned id
    ///
    /// Fails with `StoreError::DuplicateName` if the name is already stored.
    fn insert(&mut self, domain: &Domain) -> StoreResult<DomainId>;

    /// Overwrites the whole record with the given id, headers included
    fn update_by_id(&mut self, id: DomainId, domain: &Domain) -> StoreResult<()>;

    // ===== Browsing Queries =====

    /// Returns one page of domains matching `filter`, ordered by id
    fn find_page(
        &self,
        filter: &DomainFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Domain>>;

    /// Counts domains matching `filter`
    fn count(&self, filter: &DomainFilter) -> StoreResult<u64>;
}
