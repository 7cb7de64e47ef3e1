//! Paginated domain listings and parent chains
//!
//! These are the read paths behind browsing: every query is a filtered,
//! id-ordered page of the store, and a user-supplied pattern that does not
//! compile produces an empty page rather than an error.

use crate::state::{Domain, DomainId};
use crate::storage::{DomainFilter, DomainStore, StoreError, StoreResult};
use rand::Rng;
use std::collections::HashSet;

/// Domains shown per listing page
pub const RESULTS_PER_PAGE: usize = 25;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPage {
    /// 1-based page number actually served
    pub page: usize,
    pub domains: Vec<Domain>,
    /// Set when `page > 1`
    pub previous_page: Option<usize>,
    /// Set when this page is full, so more results may follow
    pub next_page: Option<usize>,
}

/// Returns one page of domains matching `filter`
///
/// Page numbers start at 1; anything lower is served as page 1.
pub fn list_domains(
    store: &dyn DomainStore,
    filter: &DomainFilter,
    page: usize,
) -> StoreResult<DomainPage> {
    let page = page.max(1);
    let offset = (page - 1) * RESULTS_PER_PAGE;

    let domains = match store.find_page(filter, RESULTS_PER_PAGE, offset) {
        Ok(domains) => domains,
        Err(StoreError::InvalidPattern(e)) => {
            tracing::warn!("Ignoring invalid pattern: {}", e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let previous_page = if page > 1 { Some(page - 1) } else { None };
    let next_page = if domains.len() == RESULTS_PER_PAGE {
        Some(page + 1)
    } else {
        None
    };

    Ok(DomainPage {
        page,
        domains,
        previous_page,
        next_page,
    })
}

/// Lists domains whose name matches `keyword`, ignoring case
pub fn search_domains(store: &dyn DomainStore, keyword: &str, page: usize) -> StoreResult<DomainPage> {
    tracing::debug!("Search query: {}", keyword);
    list_domains(store, &DomainFilter::NameMatches(format!("(?i){}", keyword)), page)
}

/// Picks a random domain that has been checked
///
/// Returns `None` while nothing has been checked yet.
pub fn random_domain<R: Rng + ?Sized>(store: &dyn DomainStore, rng: &mut R) -> StoreResult<Option<Domain>> {
    let checked = store.count(&DomainFilter::Checked)? as usize;
    if checked == 0 {
        return Ok(None);
    }

    let offset = rng.gen_range(0..checked);
    Ok(store.find_page(&DomainFilter::Checked, 1, offset)?.into_iter().next())
}

/// Walks up the `parent_domain` links of `domain`
///
/// Returns the parent first and the root last. The walk stops at a domain
/// with no parent, at a parent id that is not stored, or when an id repeats.
pub fn parent_chain(store: &dyn DomainStore, domain: &Domain) -> StoreResult<Vec<Domain>> {
    let mut chain = Vec::new();
    let mut visited: HashSet<DomainId> = domain.id.into_iter().collect();
    let mut next = domain.parent_domain;

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            tracing::warn!("Parent cycle at domain id {}", parent_id);
            break;
        }

        let parent = match store.find_by_id(parent_id) {
            Ok(parent) => parent,
            Err(StoreError::DomainNotFound(_)) => break,
            Err(e) => return Err(e),
        };

        next = parent.parent_domain;
        chain.push(parent);
    }

    Ok(chain)
}

/// Prints a listing page to stdout
pub fn print_domain_page(title: &str, listing: &DomainPage) {
    println!("=== {} (page {}) ===\n", title, listing.page);

    if listing.domains.is_empty() {
        println!("  No domains found.");
    }

    for domain in &listing.domains {
        match domain.header("Server") {
            Some(server) => println!("  {} [{}]", domain.name, server),
            None => println!("  {}", domain.name),
        }
    }
    println!();

    if let Some(previous) = listing.previous_page {
        println!("Previous: --page {}", previous);
    }
    if let Some(next) = listing.next_page {
        println!("Next: --page {}", next);
    }
}

/// Prints one domain with its headers and discovery chain
pub fn print_domain_detail(domain: &Domain, parents: &[Domain]) {
    println!("=== {} ===\n", domain.name);
    println!("  Status: {}", domain.status());

    if let Some(checked) = domain.last_checked {
        println!("  Last checked: {}", checked.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();

    if !domain.headers.is_empty() {
        println!("Headers:");
        for header in &domain.headers {
            println!("  {}: {}", header.key, header.value);
        }
        println!();
    }

    if !parents.is_empty() {
        println!("Discovered via:");
        for parent in parents {
            println!("  <- {}", parent.name);
        }
    }
}
