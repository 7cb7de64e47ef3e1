//! HTML link extraction
//!
//! Turns a front page into the list of candidate domain names its anchors
//! point at. Relative links, fragments and non-host schemes are dropped by
//! the normalizer, so only cross-host references survive.

use crate::url::normalize_href;
use crate::GenomeError;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracts the unique domain names referenced by `<a href>` elements
///
/// Names are returned in first-seen order with duplicates removed. Anchors
/// without an `href` are skipped.
///
/// # Example
///
/// ```
/// use webgenome::crawler::extract_domains;
///
/// let html = r#"<a href="http://b.com/x">B</a><a href="/local">L</a><a href="https://B.com">B</a>"#;
/// assert_eq!(extract_domains(html), vec!["b.com".to_string()]);
/// ```
pub fn extract_domains(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if let Some(name) = normalize_href(href) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
    }

    names
}

/// Reads a response body and extracts its domain names
///
/// The body is decoded lossily, so invalid UTF-8 never fails extraction.
/// A body that cannot be read is returned as [`GenomeError::Body`].
pub async fn extract_domains_from_response(
    domain_name: &str,
    response: reqwest::Response,
) -> Result<Vec<String>, GenomeError> {
    let body = response.bytes().await.map_err(|source| GenomeError::Body {
        domain: domain_name.to_string(),
        source,
    })?;

    Ok(extract_domains(&String::from_utf8_lossy(&body)))
}
