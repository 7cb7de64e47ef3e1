use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex digits of the config digest shown in crawl logs
pub const SHORT_HASH_LEN: usize = 12;

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use webgenome::config::load_config;
///
/// let config = load_config(Path::new("webgenome.toml")).unwrap();
/// println!("Max workers: {}", config.crawler.max_workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hex-encoded SHA-256 of configuration text
pub fn config_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration along with the short digest of the text it came from
///
/// The file is read once, so the digest always describes the settings the
/// crawl actually runs with, even if the file is edited mid-startup.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    let mut digest = config_digest(&content);
    digest.truncate(SHORT_HASH_LEN);
    Ok((config, digest))
}
