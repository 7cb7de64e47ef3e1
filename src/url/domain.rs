/// Checks that a string has the shape of a registrable domain name
///
/// The name is split on `.`; it needs at least two segments, a non-empty
/// first segment, and a final segment (the suffix) of two or more bytes.
/// Nothing else about the characters is checked.
///
/// # Examples
///
/// ```
/// use webgenome::url::is_valid_domain_name;
///
/// assert!(is_valid_domain_name("example.com"));
/// assert!(is_valid_domain_name("sub.example.co.uk"));
/// assert!(!is_valid_domain_name("localhost"));
/// assert!(!is_valid_domain_name("example.c"));
/// ```
pub fn is_valid_domain_name(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();

    if segments.len() < 2 {
        return false;
    }

    if segments[0].is_empty() {
        return false;
    }

    segments.last().map(|suffix| suffix.len() >= 2).unwrap_or(false)
}
