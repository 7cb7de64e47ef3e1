//! Href handling module for WebGenome
//!
//! This module turns raw anchor hrefs into canonical domain names, validates
//! domain names, and matches names against the ignore list of hosting
//! platforms that generate unbounded numbers of subdomains.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::is_valid_domain_name;
pub use matcher::{IgnoreList, DEFAULT_IGNORE_LIST};
pub use normalize::normalize_href;

/// Builds the front-page URL that is fetched for a domain
///
/// # Examples
///
/// ```
/// use webgenome::url::front_page_url;
///
/// assert_eq!(front_page_url("example.com"), "http://example.com/");
/// ```
pub fn front_page_url(domain_name: &str) -> String {
    format!("http://{}/", domain_name)
}
