//! WebGenome: a web host discovery and fingerprinting crawler
//!
//! This crate grows a table of domains breadth-first across the web graph.
//! Each unprocessed domain has its front page fetched once, the response
//! headers are recorded as a fingerprint, and every outbound anchor is
//! reduced to a domain name that is fed back into the same store.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for WebGenome operations
#[derive(Debug, Error)]
pub enum GenomeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Failed to read body of {domain}: {source}")]
    Body {
        domain: String,
        source: reqwest::Error,
    },

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Worker pool closed: {0}")]
    PoolClosed(#[from] tokio::sync::AcquireError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),
}

/// Result type alias for WebGenome operations
pub type Result<T> = std::result::Result<T, GenomeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{Domain, DomainStatus, Header};
pub use crate::url::{is_valid_domain_name, normalize_href, IgnoreList};
