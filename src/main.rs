//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror site mirror.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_mirror::config::{load_config, resolve_scope, validate, Config};
use sumi_mirror::crawler::{run_crawl, user_agent};
use sumi_mirror::output::print_summary;
use sumi_mirror::{ConfigError, MirrorError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit status for configuration errors detected before any fetch
const EXIT_CONFIG_ERROR: u8 = 2;

/// Sumi-Mirror: a scope-limited website mirror
///
/// Sumi-Mirror downloads every page and embedded resource reachable from a
/// starting URL, staying on the starting host and within a path-depth
/// window, and writes each resource to disk exactly once.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version)]
#[command(about = "A scope-limited website mirror", long_about = None)]
struct Cli {
    /// URL to start mirroring from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory [default: output]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Per-request timeout in seconds [default: 10]
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path depth window for page links; negative values widen it upward [default: 0]
    #[arg(short = 'd', long, value_name = "N", allow_negative_numbers = true)]
    max_depth: Option<i32>,

    /// Number of pages fetched concurrently [default: 4]
    #[arg(short, long, value_name = "N")]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show the crawl scope without fetching anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Loads the config file (if any) and applies command-line overrides
    fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                load_config(path)?
            }
            None => Config::default(),
        };

        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(timeout) = self.timeout {
            config.crawler.timeout_secs = timeout;
        }
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }

        validate(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if cli.dry_run {
        return match handle_dry_run(&cli.url, &config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::from(EXIT_CONFIG_ERROR)
            }
        };
    }

    handle_crawl(&cli.url, &config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
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

/// Handles the --dry-run mode: validates the start URL and shows the scope
fn handle_dry_run(start_url: &str, config: &Config) -> Result<(), ConfigError> {
    let scope = resolve_scope(start_url, config)?;

    println!("=== Sumi-Mirror Dry Run ===\n");

    println!("Scope:");
    println!("  Root: {}", scope.root);
    println!("  Host: {}", scope.root.host());
    if let Some(port) = scope.root.port() {
        println!("  Port: {}", port);
    }
    println!("  Base directory: /{}", scope.root.depth_segments().join("/"));
    println!("  Max depth: {}", scope.max_depth);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.crawler.timeout_secs);
    match config.crawler.max_consecutive_failures {
        0 => println!("  Max consecutive failures: unlimited"),
        n => println!("  Max consecutive failures: {}", n),
    }
    match config.crawler.run_timeout_secs {
        Some(secs) => println!("  Run timeout: {}s", secs),
        None => println!("  Run timeout: none"),
    }

    println!("\nUser Agent:");
    println!("  {}", user_agent(&config.user_agent));

    println!("\nOutput:");
    println!("  Directory: {}", scope.output_root.display());
    println!("  Index file name: {}", config.output.index_filename);
    println!("  Failure report: {}", config.output.failed_report);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(start_url: &str, config: &Config) -> ExitCode {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight pages");
            interrupt.cancel();
        }
    });

    match run_crawl(start_url, config, cancel).await {
        Ok(summary) => {
            if !summary.failed.is_empty() {
                tracing::warn!("{} resources could not be mirrored", summary.failed.len());
            }
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(MirrorError::Config(e)) => {
            tracing::error!("Cannot start crawl: {}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
