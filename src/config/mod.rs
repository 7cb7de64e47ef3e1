//! Configuration module for WebGenome
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use webgenome::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("webgenome.toml")).unwrap();
//! println!("Batch size: {}", config.crawler.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DomainsConfig, StoreConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{config_digest, load_config, load_config_with_hash, parse_config, SHORT_HASH_LEN};
pub use validation::validate;
