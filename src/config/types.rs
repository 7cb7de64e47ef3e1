use crate::url::DEFAULT_IGNORE_LIST;
use serde::Deserialize;

/// Main configuration structure for WebGenome
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub domains: DomainsConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// How many unprocessed domains to pull per batch
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Maximum number of fetch workers in flight at once
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Per-fetch timeout (seconds)
    #[serde(rename = "http-timeout")]
    pub http_timeout: u64,

    /// Pause after a "too many open files" error (seconds)
    #[serde(rename = "resource-cooldown", default = "default_resource_cooldown")]
    pub resource_cooldown: u64,

    /// Optional HTTP proxy every fetch is sent through
    #[serde(default)]
    pub proxy: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Domain store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Seed and ignore lists
#[derive(Debug, Clone, Deserialize)]
pub struct DomainsConfig {
    /// Domain names inserted before the crawl starts, if absent
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Name substrings that are never fetched
    #[serde(default = "default_ignore_list")]
    pub ignore: Vec<String>,
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            ignore: default_ignore_list(),
        }
    }
}

fn default_resource_cooldown() -> u64 {
    30
}

fn default_ignore_list() -> Vec<String> {
    DEFAULT_IGNORE_LIST.iter().map(|s| s.to_string()).collect()
}
