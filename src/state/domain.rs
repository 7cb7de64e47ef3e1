use crate::state::DomainStatus;
use chrono::{DateTime, Utc};

/// Store-assigned identifier of a domain record
pub type DomainId = i64;

/// One captured response header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A host name tracked by the crawl
///
/// A domain is created once, either as a seed or when another domain's page
/// links to it, and is updated once per fetch attempt. `parent_domain`
/// points at the domain whose page referenced this one and is `None` for
/// seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// Assigned by the store on insert; `None` until then
    pub id: Option<DomainId>,

    /// Lowercase host name
    pub name: String,

    /// Domain whose page referenced this one
    pub parent_domain: Option<DomainId>,

    /// Set once a fetch failed or the name is ignored; never cleared
    pub skipped: bool,

    /// Time of the most recent fetch attempt
    pub last_checked: Option<DateTime<Utc>>,

    /// Headers from the one successful response, `Date` excluded
    pub headers: Vec<Header>,
}

impl Domain {
    /// Creates a seed domain with no parent
    pub fn seed(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            parent_domain: None,
            skipped: false,
            last_checked: None,
            headers: Vec::new(),
        }
    }

    /// Creates a domain discovered on the page of `parent`
    pub fn discovered(name: impl Into<String>, parent: DomainId) -> Self {
        Self {
            parent_domain: Some(parent),
            ..Self::seed(name)
        }
    }

    /// Returns the current lifecycle status
    pub fn status(&self) -> DomainStatus {
        if self.skipped {
            DomainStatus::Skipped
        } else if !self.headers.is_empty() || self.last_checked.is_some() {
            DomainStatus::Checked
        } else {
            DomainStatus::Unprocessed
        }
    }

    /// Returns true if the scheduler may still pick this domain
    pub fn is_unprocessed(&self) -> bool {
        self.status() == DomainStatus::Unprocessed
    }

    /// Returns the first header with the given key, ignoring case
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(key))
            .map(|h| h.value.as_str())
    }
}
