use std::fmt;

/// Lifecycle status of a domain, derived from its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainStatus {
    /// Never attempted; eligible for the next batch
    Unprocessed,

    /// Fetched successfully; headers recorded
    Checked,

    /// Ignored or failed; never attempted again
    Skipped,
}

impl DomainStatus {
    /// Returns true if the domain will not be fetched again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unprocessed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unprocessed => "unprocessed",
            Self::Checked => "checked",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!DomainStatus::Unprocessed.is_terminal());
        assert!(DomainStatus::Checked.is_terminal());
        assert!(DomainStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(DomainStatus::Skipped.to_string(), "skipped");
    }
}
