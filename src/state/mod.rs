//! State module for domain records
//!
//! This module defines the unit of work and of storage for the crawl.
//!
//! # Components
//!
//! - `Domain`: One host name with its parent link, skip flag and fingerprint
//! - `Header`: One captured `(key, value)` response header
//! - `DomainStatus`: Where a domain sits in its fetch lifecycle

mod domain;
mod status;

// Re-export main types
pub use domain::{Domain, DomainId, Header};
pub use status::DomainStatus;
