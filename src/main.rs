//! Sumi-Gleaner main entry point
//!
//! This is the command-line interface for the Sumi-Gleaner site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_gleaner::config::{load_config_with_hash, validate, Config};
use sumi_gleaner::output::print_summary;
use sumi_gleaner::{CrawlEngine, SessionRegistry};
use tracing_subscriber::EnvFilter;

/// Sumi-Gleaner: a site-scoped content gleaner
///
/// Sumi-Gleaner walks one website from a seed URL up to a bounded link depth,
/// saves each page as Markdown, and downloads the images and documents it finds.
#[derive(Parser, Debug)]
#[command(name = "sumi-gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A site-scoped content gleaner", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Session id; output is written to <output>/<session>/
    #[arg(short, long, default_value = "default")]
    session: String,

    /// Maximum link depth (overrides the config file)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Output root directory (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

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

    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;
    let max_depth = cli.depth.unwrap_or(config.crawler.max_depth);

    let engine = CrawlEngine::new(&config).context("Failed to build crawl engine")?;
    let registry = Arc::new(SessionRegistry::new());
    registry.register(cli.session.as_str(), &engine);

    // Ctrl-C asks the session to wind down; the summary is still printed
    let interrupt = Arc::clone(&registry);
    let session = cli.session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping session {}", session);
            interrupt.stop(&session);
        }
    });

    tracing::info!(
        "Output root: {}, max depth: {}",
        engine.output_root().display(),
        max_depth
    );

    let quiet = cli.quiet;
    let result = engine
        .start(
            cli.session.as_str(),
            &cli.seed,
            max_depth,
            move |line: String| {
                if !quiet {
                    println!("{}", line);
                }
            },
            |count: u64| tracing::debug!("Pages visited: {}", count),
        )
        .await;

    registry.unregister(&cli.session);

    match result {
        Ok(summary) => {
            println!();
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_gleaner=warn,warn"),
            1 => EnvFilter::new("sumi_gleaner=info,warn"),
            2 => EnvFilter::new("sumi_gleaner=debug,info"),
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

/// Loads the config file if given, then applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(output) = &cli.output {
        config.output.root_dir = output.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}
