//! trendwatch CLI
//!
//! Runs the trending-topic crawler on a schedule or once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use trendwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{Schedule, TrendPipeline, run_schedule},
    storage::LocalStorage,
    utils::HttpFetcher,
};

/// trendwatch - Trending Topic Crawler
#[derive(Parser, Debug)]
#[command(
    name = "trendwatch",
    version,
    about = "Periodically crawls a trending-topic board"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every interval until the configured end time (Ctrl-C stops between cycles)
    Run,

    /// Run a single cycle and persist the result
    Once {
        /// Number of most recent snapshots to write (default: storage.persist_latest)
        #[arg(long)]
        latest: Option<usize>,

        /// Output directory (default: storage.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the snapshot as JSON
        #[arg(long)]
        print: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build a pipeline writing to `output_dir`.
async fn build_pipeline(config: Arc<Config>, output_dir: PathBuf) -> Result<TrendPipeline> {
    let storage = LocalStorage::new(output_dir);
    storage.prepare().await?;
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    TrendPipeline::new(config, Arc::new(fetcher), Arc::new(storage))
}

/// Load and validate the configuration file.
fn load_config(path: &Path) -> Result<Arc<Config>> {
    let config = if path.exists() {
        Config::load(path)
            .map_err(|e| AppError::config(format!("cannot load {}: {e}", path.display())))?
    } else {
        Config::load_or_default(path)
    };
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("Loaded configuration from {}", path.display());
    Ok(Arc::new(config))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run => {
            let config = load_config(&cli.config)?;
            let schedule = Schedule::from_config(&config.schedule)?;
            let mut pipeline =
                build_pipeline(Arc::clone(&config), PathBuf::from(&config.storage.output_dir))
                    .await?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        log::info!("Received Ctrl+C, stopping after the current cycle");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => {
                        log::warn!("Cannot listen for Ctrl+C ({e}); running until the end time");
                        std::future::pending::<()>().await;
                    }
                }
            });

            let summary = run_schedule(&mut pipeline, &schedule, shutdown_rx).await;
            log::info!(
                "Crawled {} cycles ({} failed), {} snapshots in memory",
                summary.cycles,
                summary.failed,
                pipeline.history().len()
            );
        }

        Command::Once {
            latest,
            output,
            print,
        } => {
            let config = load_config(&cli.config)?;
            let output_dir = output.unwrap_or_else(|| PathBuf::from(&config.storage.output_dir));
            let mut pipeline = build_pipeline(Arc::clone(&config), output_dir).await?;

            let report = pipeline.run_cycle().await?;
            if let Some(n) = latest.filter(|n| *n != config.storage.persist_latest) {
                let persisted = pipeline.persist_latest(n).await?;
                log::info!("{}", persisted.status());
            }

            if let Some(snapshot) = pipeline.latest() {
                log::info!("{} {}", config.source.banner, snapshot.key());
                for topic in snapshot.topics() {
                    log::info!(
                        "  #{:<2} {} {} {} ({} posts)",
                        topic.rank,
                        topic.name,
                        topic.number,
                        topic.label_glyph().unwrap_or(""),
                        topic.posts.len()
                    );
                }
                if print {
                    println!("{}", serde_json::to_string_pretty(&snapshot.document())?);
                }
            }
            log::info!("Cycle {} complete", report.key);
        }

        Command::Validate => {
            let config = load_config(&cli.config)?;
            Schedule::from_config(&config.schedule)?;
            log::info!("✓ Config OK");
        }

        Command::Init { force } => {
            if cli.config.exists() && !force {
                log::warn!(
                    "{} already exists. Use --force to overwrite.",
                    cli.config.display()
                );
                return Ok(());
            }
            std::fs::write(&cli.config, Config::default().to_toml()?)?;
            log::info!("Default configuration written to {}", cli.config.display());
        }
    }

    Ok(())
}
