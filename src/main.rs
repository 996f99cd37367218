//! Review-Harvester main entry point
//!
//! This is the command-line interface for the Review-Harvester review crawler.

use clap::Parser;
use review_harvester::config::{load_config_with_hash, Config};
use review_harvester::crawler::{preflight_proxies, run_discovery, run_harvest};
use review_harvester::input::{load_proxies, load_targets};
use review_harvester::output::{print_statistics, print_stored_statistics};
use review_harvester::proxy::{ProxyEndpoint, ProxyPool};
use review_harvester::session::{check_proxies, HttpSessionClient};
use review_harvester::storage::load_statistics;
use review_harvester::InputError;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Review-Harvester: a resilient paginated review crawler
///
/// Review-Harvester collects per-item review pages from a storefront that
/// rate-limits and soft-blocks automated clients. It rotates proxies and
/// client identities, tells real end-of-data apart from blocking, and
/// stores the extracted reviews in SQLite.
#[derive(Parser, Debug)]
#[command(name = "review-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resilient paginated review crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// JSON list of items to harvest
    #[arg(long, value_name = "PATH", default_value = "data/targets.json")]
    targets: PathBuf,

    /// Proxy list, one `address:port[:username:password]` per line
    #[arg(long, value_name = "PATH", default_value = "env/proxy_list.txt")]
    proxies: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and inputs and show what would be harvested
    #[arg(long, conflicts_with_all = ["stats", "discover", "check_proxies"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "discover", "check_proxies"])]
    stats: bool,

    /// Collect items from the configured listing pages into a target list
    #[arg(long, value_name = "OUT", conflicts_with_all = ["dry_run", "stats", "check_proxies"])]
    discover: Option<PathBuf>,

    /// Test every proxy against `proxy.preflight-url` and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "discover"])]
    check_proxies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.targets, &cli.proxies)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(out) = &cli.discover {
        handle_discover(&config, out).await?;
    } else if cli.check_proxies {
        handle_check_proxies(&config, &cli.proxies).await?;
    } else {
        handle_harvest(config, &config_hash, &cli.targets, &cli.proxies).await?;
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
            0 => EnvFilter::new("review_harvester=info,warn"),
            1 => EnvFilter::new("review_harvester=debug,info"),
            2 => EnvFilter::new("review_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// A token cancelled on the first Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current step and saving progress");
            trigger.cancel();
        }
    });
    token
}

/// Loads the proxy list, enforcing `proxy.required`
fn load_endpoints(
    config: &Config,
    path: &Path,
) -> Result<Vec<ProxyEndpoint>, Box<dyn std::error::Error>> {
    let endpoints = load_proxies(path)?;
    if endpoints.is_empty() {
        if config.proxy.required {
            return Err(InputError::NoProxies(path.display().to_string()).into());
        }
        tracing::warn!("No proxies loaded from {}, using direct connections", path.display());
    }
    Ok(endpoints)
}

/// Handles the --dry-run mode: validates config and inputs without any network access
fn handle_dry_run(
    config: &Config,
    targets: &Path,
    proxies: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Review-Harvester Dry Run ===\n");

    println!("Target:");
    println!("  Storefront: {}", config.target.base_url);
    println!("  Review endpoint: {}", config.target.review_endpoint);
    println!("  Page size: {}", config.target.page_size);

    println!("\nCrawler Configuration:");
    println!("  Max pages per item: {}", config.crawler.max_pages);
    println!("  Max empty pages: {}", config.crawler.max_empty_pages);
    println!("  Attempts per page: {}", config.crawler.retry_attempts);
    println!("  Proxy changes per empty streak: {}", config.crawler.proxy_change_budget);
    println!(
        "  Cooldown after {} timeouts: {:.0}-{:.0}s",
        config.cooldown.trigger, config.cooldown.window.min, config.cooldown.window.max
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let items = load_targets(targets, &config.target)?;
    println!("\nTarget Items ({}):", items.len());
    for item in &items {
        println!("  - {} ({})", item.name, item.id);
    }

    let endpoints = load_endpoints(config, proxies)?;
    println!(
        "\nProxies: {}{}",
        endpoints.len(),
        if config.proxy.preflight { " (checked before the run)" } else { "" }
    );
    for endpoint in &endpoints {
        println!("  - {}", endpoint);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} items", items.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let stats = load_statistics(Path::new(&config.output.database_path))?;
    print_stored_statistics(&stats);

    Ok(())
}

/// Handles the --discover mode: writes a target list from listing pages
async fn handle_discover(config: &Config, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Discovering targets from {} listing pages",
        config.listing.max_pages
    );

    let written = run_discovery(config, out, shutdown_token()).await?;
    println!("✓ Wrote {} targets to {}", written, out.display());

    Ok(())
}

/// Handles the --check-proxies mode: reports which proxies can reach the check URL
async fn handle_check_proxies(
    config: &Config,
    proxies: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoints = load_proxies(proxies)?;
    let total = endpoints.len();
    println!("=== Proxy Check ({}) ===\n", config.proxy.preflight_url);

    let client = HttpSessionClient::new(&config.http);
    let check = check_proxies(&client, endpoints, &config.proxy.preflight_url).await;

    for endpoint in &check.working {
        println!("  ✓ {}", endpoint);
    }
    for (endpoint, reason) in &check.failed {
        println!("  ✗ {} ({})", endpoint, reason);
    }
    println!("\nWorking: {} / {}", check.working.len(), total);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: &str,
    targets: &Path,
    proxies: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = load_targets(targets, &config.target)?;
    let endpoints = load_endpoints(&config, proxies)?;
    let endpoints =
        preflight_proxies(&config, &HttpSessionClient::new(&config.http), endpoints).await?;
    let pool = ProxyPool::new(endpoints, &config.proxy);

    tracing::info!(
        "Harvesting {} items through {} proxies",
        items.len(),
        pool.len()
    );

    match run_harvest(config, config_hash, items, pool, shutdown_token()).await {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
