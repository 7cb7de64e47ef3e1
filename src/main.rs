//! WebGenome main entry point
//!
//! This is the command-line interface for the WebGenome host fingerprinting crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use webgenome::config::{load_config_with_hash, Config};
use webgenome::crawler::crawl;
use webgenome::output::{
    find_fingerprint, list_domains, load_statistics, parent_chain, print_domain_detail,
    print_domain_page, print_statistics, random_domain, search_domains, FINGERPRINTS,
};
use webgenome::storage::{DomainStore, SqliteStore};

/// WebGenome: discovers web hosts and records their server fingerprints
///
/// WebGenome fetches the front page of every known domain, stores the
/// response headers, and adds every domain linked from that page to the
/// queue, growing the crawl outward from a set of seeds.
#[derive(Parser, Debug)]
#[command(name = "webgenome")]
#[command(version = "1.0.0")]
#[command(about = "Web host discovery and fingerprinting crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity and log every domain (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "browse", "search", "show", "random"])]
    dry_run: bool,

    /// Show domain counts from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "browse", "search", "show", "random"])]
    stats: bool,

    /// List domains matching a fingerprint ("list" shows the catalog)
    #[arg(long, value_name = "SLUG", conflicts_with_all = ["dry_run", "stats", "search", "show", "random"])]
    browse: Option<String>,

    /// List domains whose name contains a keyword (case-insensitive regex)
    #[arg(long, value_name = "KEYWORD", conflicts_with_all = ["dry_run", "stats", "browse", "show", "random"])]
    search: Option<String>,

    /// Show one domain's headers and how it was discovered
    #[arg(long, value_name = "NAME", conflicts_with_all = ["dry_run", "stats", "browse", "search", "random"])]
    show: Option<String>,

    /// Show a randomly picked checked domain
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "browse", "search", "show"])]
    random: bool,

    /// Page number for --browse and --search
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(slug) = &cli.browse {
        handle_browse(&config, slug, cli.page)?;
    } else if let Some(keyword) = &cli.search {
        handle_search(&config, keyword, cli.page)?;
    } else if let Some(name) = &cli.show {
        handle_show(&config, name)?;
    } else if cli.random {
        handle_random(&config)?;
    } else {
        handle_crawl(config, cli.verbose > 0).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webgenome=info,warn"),
            1 => EnvFilter::new("webgenome=debug,info"),
            _ => EnvFilter::new("webgenome=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens the configured database for reading
fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = Path::new(&config.store.database_path);
    SqliteStore::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== WebGenome Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  HTTP timeout: {}s", config.crawler.http_timeout);
    println!("  Resource cooldown: {}s", config.crawler.resource_cooldown);
    if let Some(proxy) = &config.crawler.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\nSeeds ({}):", config.domains.seeds.len());
    for seed in &config.domains.seeds {
        println!("  - {}", seed);
    }

    println!("\nIgnored ({}):", config.domains.ignore.len());
    for entry in &config.domains.ignore {
        println!("  - {}", entry);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows domain counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --browse mode: lists domains matching a named fingerprint
fn handle_browse(config: &Config, slug: &str, page: usize) -> anyhow::Result<()> {
    if slug == "list" {
        println!("Available fingerprints:");
        for fingerprint in FINGERPRINTS {
            println!("  {:<18} {}", fingerprint.slug, fingerprint.title);
        }
        return Ok(());
    }

    let Some(fingerprint) = find_fingerprint(slug) else {
        bail!("Unknown fingerprint '{}'; use --browse list to see them", slug);
    };

    let store = open_store(config)?;
    let listing = list_domains(&store, &fingerprint.filter(), page)?;
    print_domain_page(fingerprint.title, &listing);

    Ok(())
}

/// Handles the --search mode: lists domains by name keyword
fn handle_search(config: &Config, keyword: &str, page: usize) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let listing = search_domains(&store, keyword, page)?;
    print_domain_page("Search Results", &listing);

    Ok(())
}

/// Handles the --show mode: prints one domain with its discovery chain
fn handle_show(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let Some(domain) = store.find_by_name(&name.to_lowercase())? else {
        bail!("Domain '{}' is not in the database", name);
    };

    let parents = parent_chain(&store, &domain)?;
    print_domain_detail(&domain, &parents);

    Ok(())
}

/// Handles the --random mode: prints one randomly picked checked domain
fn handle_random(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let Some(domain) = random_domain(&store, &mut rand::thread_rng())? else {
        bail!("No checked domains yet; run a crawl first");
    };

    let parents = parent_chain(&store, &domain)?;
    print_domain_detail(&domain, &parents);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, verbose: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, ignore entries: {}",
        config.domains.seeds.len(),
        config.domains.ignore.len()
    );

    // Run the crawler
    match crawl(config, verbose).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed: {} domains checked, {} new domains discovered",
                report.domains,
                report.discovered
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
