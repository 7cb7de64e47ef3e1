/// Hosting platforms that hand out an effectively unbounded number of subdomains
pub const DEFAULT_IGNORE_LIST: &[&str] = &[
    ".blogspot.com",
    ".tumblr.com",
    ".booked.net",
    ".deviantart.com",
    ".zxdyw.com",
    ".fang.com",
    ".8671.net",
];

/// A deny-list of name substrings
///
/// A domain is ignored when its name contains any of the entries anywhere,
/// not only as a suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    /// Creates an ignore list from the given substrings
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the first entry contained in `name`, if any
    ///
    /// # Examples
    ///
    /// ```
    /// use webgenome::url::IgnoreList;
    ///
    /// let list = IgnoreList::default();
    /// assert_eq!(list.matching("someone.blogspot.com"), Some(".blogspot.com"));
    /// assert_eq!(list.matching("example.com"), None);
    /// ```
    pub fn matching(&self, name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| name.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Returns true if `name` contains any ignored substring
    pub fn is_ignored(&self, name: &str) -> bool {
        self.matching(name).is_some()
    }

    /// Returns the configured substrings
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if nothing is ignored
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_LIST.iter().copied())
    }
}
