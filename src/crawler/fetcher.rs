//! Domain fetcher
//!
//! A fetcher visits one domain's front page, records what the server said
//! about itself, persists the result, and inserts any newly referenced
//! domains into the store. Each call owns its domain record exclusively and
//! writes it back exactly once.

use crate::config::Config;
use crate::crawler::parser::extract_domains_from_response;
use crate::state::{Domain, DomainId, Header};
use crate::storage::{lock_store, SharedStore, StoreError};
use crate::url::{front_page_url, IgnoreList};
use crate::GenomeError;
use chrono::Utc;
use reqwest::header::{HeaderMap, CONNECTION, DATE};
use reqwest::{Client, Proxy};
use std::error::Error as StdError;
use std::time::Duration;

/// `EMFILE`: per-process descriptor limit reached
const EMFILE: i32 = 24;

/// `ENFILE`: system-wide descriptor limit reached
const ENFILE: i32 = 23;

/// Settings every fetch shares
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound on a whole fetch, body included
    pub timeout: Duration,

    /// Pause taken after a descriptor-exhaustion failure
    pub cooldown: Duration,

    /// Value sent as the User-Agent header
    pub user_agent: String,

    /// Optional HTTP proxy all fetches go through
    pub proxy: Option<String>,

    /// Names containing any of these substrings are never fetched
    pub ignore: IgnoreList,

    /// Log per-domain progress at info level
    pub verbose: bool,
}

impl FetchSettings {
    /// Derives fetch settings from the loaded configuration
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        Self {
            timeout: Duration::from_secs(config.crawler.http_timeout),
            cooldown: Duration::from_secs(config.crawler.resource_cooldown),
            user_agent: config.user_agent.header_value(),
            proxy: config.crawler.proxy.clone(),
            ignore: IgnoreList::new(config.domains.ignore.iter().cloned()),
            verbose,
        }
    }
}

/// Why a domain was marked skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The name contains an ignore-list entry; no request was made
    Ignored { pattern: String },

    /// A request could not be built for the name
    InvalidRequest(String),

    /// The request was sent but no response came back
    FetchFailed {
        error: String,
        /// The failure was descriptor exhaustion and a cooldown was taken
        resource_exhausted: bool,
    },
}

/// Result of processing one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A response was received and its headers recorded
    Success {
        /// Number of headers captured
        headers: usize,
        /// Number of new domains inserted from the page's links
        discovered: usize,
    },

    /// The domain was marked skipped
    Skipped(SkipReason),
}

impl FetchOutcome {
    /// Returns true for [`FetchOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the HTTP client shared by all fetches
///
/// Idle connections are never pooled, since every host is visited once and
/// kept-alive sockets only hold descriptors open.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use webgenome::crawler::{build_http_client, FetchSettings};
/// use webgenome::IgnoreList;
///
/// let settings = FetchSettings {
///     timeout: Duration::from_secs(5),
///     cooldown: Duration::from_secs(30),
///     user_agent: "WebGenome/1.0 (+https://example.com/bot; bot@example.com)".to_string(),
///     proxy: None,
///     ignore: IgnoreList::default(),
///     verbose: false,
/// };
///
/// let client = build_http_client(&settings).unwrap();
/// ```
pub fn build_http_client(settings: &FetchSettings) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout)
        .pool_max_idle_per_host(0)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(Proxy::http(proxy.as_str())?);
    }

    builder.build()
}

/// Processes domains against the shared store
pub struct DomainFetcher {
    client: Client,
    store: SharedStore,
    settings: FetchSettings,
}

impl DomainFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(store: SharedStore, settings: FetchSettings) -> Result<Self, GenomeError> {
        let client = build_http_client(&settings)?;
        Ok(Self::with_client(client, store, settings))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, store: SharedStore, settings: FetchSettings) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    /// Returns the settings this fetcher runs with
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches one domain's front page and records the outcome
    ///
    /// The record always gets `last_checked` stamped and is written back
    /// exactly once, before any discovered domain is inserted. Only a failed
    /// write-back is returned as an error; every per-domain failure is folded
    /// into the outcome.
    pub async fn process(&self, mut domain: Domain) -> Result<FetchOutcome, GenomeError> {
        let id = domain
            .id
            .ok_or_else(|| StoreError::MissingId(domain.name.clone()))?;
        domain.last_checked = Some(Utc::now());

        if let Some(pattern) = self.settings.ignore.matching(&domain.name) {
            let pattern = pattern.to_string();
            if self.settings.verbose {
                tracing::info!("Skipping ignored subdomain: {} ({})", domain.name, pattern);
            }

            domain.skipped = true;
            self.persist(id, &domain)?;
            return Ok(FetchOutcome::Skipped(SkipReason::Ignored { pattern }));
        }

        let request = match self
            .client
            .get(front_page_url(&domain.name))
            .header(CONNECTION, "close")
            .build()
        {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(
                    "Problem creating request for {}, marking skipped: {}",
                    domain.name,
                    e
                );

                domain.skipped = true;
                self.persist(id, &domain)?;
                return Ok(FetchOutcome::Skipped(SkipReason::InvalidRequest(
                    e.to_string(),
                )));
            }
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                if self.settings.verbose {
                    tracing::warn!("Error fetching {}: {}", domain.name, e);
                }
                let resource_exhausted = is_resource_exhaustion(&e);
                return self
                    .skip_after_fetch_error(id, domain, e.to_string(), resource_exhausted)
                    .await;
            }
        };

        domain.headers = capture_headers(response.headers());
        self.persist(id, &domain)?;
        if self.settings.verbose {
            tracing::info!("Updated domain info: {}", domain.name);
        }

        let names = match extract_domains_from_response(&domain.name, response).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
        };

        if self.settings.verbose && !names.is_empty() {
            tracing::info!("Domains found in {}: {}", domain.name, names.join(", "));
        }

        let discovered = self.record_discovered(id, &names)?;

        Ok(FetchOutcome::Success {
            headers: domain.headers.len(),
            discovered,
        })
    }

    /// Marks a domain skipped after its request failed
    ///
    /// When the failure was descriptor exhaustion the cooldown is taken
    /// first, so the worker keeps its permit and the rest of the pool backs
    /// off with it.
    async fn skip_after_fetch_error(
        &self,
        id: DomainId,
        mut domain: Domain,
        error: String,
        resource_exhausted: bool,
    ) -> Result<FetchOutcome, GenomeError> {
        if resource_exhausted {
            tracing::error!(
                "Out of file descriptors while fetching {}; pausing {:?}",
                domain.name,
                self.settings.cooldown
            );
            tokio::time::sleep(self.settings.cooldown).await;
            tracing::info!("Resuming after descriptor cooldown");
        }

        domain.skipped = true;
        self.persist(id, &domain)?;
        Ok(FetchOutcome::Skipped(SkipReason::FetchFailed {
            error,
            resource_exhausted,
        }))
    }

    /// Writes the domain record back to the store
    fn persist(&self, id: DomainId, domain: &Domain) -> Result<(), GenomeError> {
        let mut store = lock_store(&self.store)?;
        store.update_by_id(id, domain).map_err(|e| {
            tracing::error!("Failed to update {}: {}", domain.name, e);
            e
        })?;
        Ok(())
    }

    /// Inserts every name not already in the store, returning how many were new
    ///
    /// A failed lookup or insert drops that one name. The lookup and insert
    /// share one lock guard, so workers in this process never race on a name.
    fn record_discovered(&self, parent: DomainId, names: &[String]) -> Result<usize, GenomeError> {
        let mut inserted = 0;

        for name in names {
            let mut store = lock_store(&self.store)?;

            match store.find_by_name(name) {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Error looking up discovered domain {}: {}", name, e);
                    continue;
                }
            }

            match store.insert(&Domain::discovered(name.as_str(), parent)) {
                Ok(_) => inserted += 1,
                // Only reachable when another process writes the same database
                Err(StoreError::DuplicateName(_)) => {
                    tracing::debug!("{} was inserted concurrently", name);
                }
                Err(e) => {
                    tracing::error!("Error inserting discovered domain {}: {}", name, e);
                }
            }
        }

        Ok(inserted)
    }
}

/// Captures response headers for storage
///
/// `Date` is dropped since it changes on every request. When a header
/// repeats only its first value is kept. Keys are stored in canonical
/// `Title-Case` form.
pub fn capture_headers(headers: &HeaderMap) -> Vec<Header> {
    let mut captured = Vec::new();

    for key in headers.keys() {
        if *key == DATE {
            continue;
        }

        if let Some(value) = headers.get(key) {
            captured.push(Header::new(
                canonical_header_key(key.as_str()),
                String::from_utf8_lossy(value.as_bytes()),
            ));
        }
    }

    captured
}

/// Formats a header name in canonical form, e.g. `x-powered-by` as `X-Powered-By`
pub fn canonical_header_key(key: &str) -> String {
    key.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Returns true if an error was caused by running out of file descriptors
pub fn is_resource_exhaustion(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);

    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(io.raw_os_error(), Some(EMFILE) | Some(ENFILE)) {
                return true;
            }
        }

        if e.to_string().to_lowercase().contains("too many open files") {
            return true;
        }

        current = e.source();
    }

    false
}
