use crate::url::domain::is_valid_domain_name;

/// Characters that end the host portion of an href, in the order they are cut
///
/// Each cut is applied to the result of the previous one. Changing the order
/// changes which names are produced, so the order is fixed.
const HOST_TERMINATORS: &[char] = &[' ', '@', '?', '&', '%', '/', '#'];

/// Reduces a raw anchor href to the domain name it points at
///
/// This is a syntactic heuristic rather than a URL parser. It accepts some
/// false positives (ports stay glued to the name) and rejects IP literals,
/// but it always produces the same name for the same host, which is what
/// keeps discovery from inserting variants of one domain.
///
/// # Rules
///
/// Applied in order; the first failure rejects the href:
///
/// 1. Shorter than 3 bytes: rejected
/// 2. Starts with a single `/` (relative path): rejected
/// 3. Must contain `//`; everything up to and including it is dropped
/// 4. Everything up to and including `mailto:` is dropped
/// 5. Cut at the first space, `@`, `?`, `&`, `%`, `/`, `#` (in that order)
/// 6. What remains must be a valid domain name
/// 7. The name is lowercased
///
/// # Arguments
///
/// * `href` - The raw `href` attribute value
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain name
/// * `None` - The href carries no usable host
///
/// # Examples
///
/// ```
/// use webgenome::url::normalize_href;
///
/// assert_eq!(normalize_href("http://Example.com/path"), Some("example.com".to_string()));
/// assert_eq!(normalize_href("HTTP://A.bb?x=1"), Some("a.bb".to_string()));
/// assert_eq!(normalize_href("/relative"), None);
/// ```
pub fn normalize_href(href: &str) -> Option<String> {
    // Rule 1: too short to name anything
    if href.len() < 3 {
        return None;
    }

    // Rule 2: relative path. Protocol-relative "//host" still names a host.
    if href.starts_with('/') && !href.starts_with("//") {
        return None;
    }

    // Rule 3: drop the scheme and separator
    let pos = href.find("//")?;
    let mut host = &href[pos + 2..];

    // Rule 4: drop an embedded mailto: and everything before it
    if let Some(pos) = host.find("mailto:") {
        host = &host[pos + "mailto:".len()..];
    }

    // Rule 5: cut at each terminator in turn
    for terminator in HOST_TERMINATORS {
        if let Some(pos) = host.find(*terminator) {
            host = &host[..pos];
        }
    }

    // Rule 6
    if !is_valid_domain_name(host) {
        return None;
    }

    // Rule 7
    Some(host.to_lowercase())
}
