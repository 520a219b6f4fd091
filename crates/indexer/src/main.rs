//! Query node projector binary.
//!
//! Reads runtime events block by block from a newline-delimited JSON feed and
//! projects forum and content state into SQLite.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use querynode_indexer::config::{Config, LoggingConfig};
use querynode_indexer::dispatcher::Projector;
use querynode_indexer::listener::{BlockFeed, SyncEngine};
use querynode_indexer::storage::Storage;

#[derive(Parser)]
#[command(name = "querynode-indexer")]
#[command(version, about = "Projects forum and content runtime events into SQLite", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "querynode.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the event feed into the database
    Run {
        /// Event feed, overriding `source.events_path`
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Show sync progress and entity counts
    Status,

    /// Initialize the database
    InitDb {
        /// Database URL
        #[arg(long, default_value = "sqlite://querynode.db")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { events: None }) {
        Commands::Run { events } => {
            let config = Config::from_file(&cli.config).context("Failed to load configuration")?;
            init_logging(&config.logging, cli.debug)?;
            info!("Query node projector {}", env!("CARGO_PKG_VERSION"));
            run(config, events).await?
        }
        Commands::Status => {
            init_logging(&LoggingConfig::default(), cli.debug)?;
            show_status(&cli.config).await?
        }
        Commands::InitDb { database_url } => {
            init_logging(&LoggingConfig::default(), cli.debug)?;
            init_database(&database_url).await?
        }
    }

    Ok(())
}

/// Initialize tracing subscriber for logging.
fn init_logging(logging: &LoggingConfig, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("querynode_indexer=debug,sqlx=warn")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&logging.level))
            .context("Invalid log level")?
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_line_number(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<Storage> {
    let storage = Storage::new(
        &config.database.url,
        Some(config.database.max_connections),
        Some(config.database.min_connections),
    )
    .await
    .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    Ok(storage)
}

/// Project the configured feed until it ends.
async fn run(config: Config, events: Option<PathBuf>) -> Result<()> {
    let events_path = events.unwrap_or_else(|| config.source.events_path.clone());

    info!("  Database: {}", config.database.url);
    info!("  Events: {}", events_path.display());
    info!("  Start block: {}", config.source.start_block);

    let storage = connect(&config).await?;
    let engine = SyncEngine::new(Projector::new(storage.clone()), config.source.start_block);

    let mut feed = BlockFeed::open(&events_path).await?;
    let report = engine.run(&mut feed).await;

    storage.close().await;

    let report = report?;
    info!(
        blocks = report.blocks,
        events = report.events,
        "Projection finished"
    );

    Ok(())
}

async fn show_status(config_path: &str) -> Result<()> {
    info!("Checking projector status");

    // Fall back to the default database only if the config file does not exist
    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            let is_not_found = e.chain().any(|cause| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
            });

            if !is_not_found {
                return Err(e).context("Failed to load config file");
            }
            info!("Config file not found, using default database: sqlite://querynode.db");
            Config::from_toml_str("[database]\nurl = \"sqlite://querynode.db\"\n")?
        }
    };

    let storage = connect(&config).await?;
    let sync_state = storage.get_sync_state().await?;
    let stats = storage.stats().await?;

    println!("\n=== Query Node Status ===\n");
    println!("Sync Progress:");
    match sync_state.last_block_number {
        Some(block) => println!("  Last Block: {}", block),
        None => println!("  Last Block: none"),
    }
    println!(
        "  Last Updated: {}",
        chrono::DateTime::from_timestamp(sync_state.updated_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );

    println!("\nDatabase Statistics:");
    println!("  Events: {}", stats.event_count);
    println!("  Forum categories: {}", stats.category_count);
    println!("  Forum threads: {}", stats.thread_count);
    println!("  Forum posts: {}", stats.post_count);
    println!("  Channels: {}", stats.channel_count);
    println!("  Videos: {}", stats.video_count);
    println!();

    storage.close().await;

    Ok(())
}

async fn init_database(database_url: &str) -> Result<()> {
    info!("Initializing database: {}", database_url);

    let storage = Storage::new(database_url, None, None)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    storage
        .health_check()
        .await
        .context("Database health check failed")?;

    let stats = storage.stats().await?;
    info!("Database initialized successfully!");
    info!("  Events: {}", stats.event_count);
    info!("  Last block: {:?}", stats.last_block_number);

    storage.close().await;

    Ok(())
}
