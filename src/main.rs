//! Comic-Mirror main entry point
//!
//! This is the command-line interface for mirroring one comic entry.

use anyhow::{bail, Context};
use clap::Parser;
use comic_mirror::config::{load_config_with_hash, validate, Config};
use comic_mirror::crawler::run_crawl;
use comic_mirror::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Comic-Mirror: an idempotent mirror for paginated comic entries
///
/// Fetches the main page of one entry, its sub-pages and every embedded
/// image into `<root-path>/<title>/`. Artifacts already on disk are reused,
/// so running the same entry again makes no requests.
#[derive(Parser, Debug)]
#[command(name = "comic-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a paginated comic entry to disk", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Main page of the entry (`.../<number>.html`)
    #[arg(long)]
    url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Directory the entry is mirrored into
    #[arg(long, value_name = "DIR")]
    root_path: Option<String>,

    /// Retries after the first attempt of a request
    #[arg(long, value_name = "N")]
    max_retry_times: Option<u32>,

    /// Serve canned payloads instead of touching the network
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    tracing::info!(
        "Mirroring {} into {}",
        config.target.url,
        config.output.root_path
    );

    let report = match run_crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(anyhow::Error::new(e).context("crawl aborted"));
        }
    };

    if !cli.quiet {
        print_report(&report);
    }
    if !report.is_complete() {
        tracing::warn!(
            "Crawl finished with {} skipped units",
            report.failures.len()
        );
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
            0 => EnvFilter::new("comic_mirror=info,warn"),
            1 => EnvFilter::new("comic_mirror=debug,info"),
            2 => EnvFilter::new("comic_mirror=trace,debug"),
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

/// Loads the configuration file if one is given, then applies the CLI flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.url {
            Some(url) => Config::new(url.clone()),
            None => bail!("either --config or --url is required"),
        },
    };

    if let Some(url) = &cli.url {
        config.target.url = url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout = timeout;
    }
    if let Some(root_path) = &cli.root_path {
        config.output.root_path = root_path.clone();
    }
    if let Some(max_retry_times) = cli.max_retry_times {
        config.fetch.max_retry_times = max_retry_times;
    }
    if cli.debug {
        config.fetch.debug = true;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}
