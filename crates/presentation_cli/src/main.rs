//! SchroKV CLI
//!
//! Command-line interface for poking at the chaotic key-value store:
//! single operations, seeding, a guided demo, and a watch mode that keeps
//! mutating random records.

#![allow(clippy::print_stdout)]

mod commands;

use application::{ChaosEngine, ChaosKvStore};
use clap::{Parser, Subcommand};
use infrastructure::{AppConfig, AsyncDatabaseConfig, SqlxKvBackend, shared_database};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SchroKV CLI
#[derive(Parser)]
#[command(name = "schrokv")]
#[command(author, version, about = "A key-value store that lies to you", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the SQLite database file
    #[arg(long, env = "SCHROKV_DATABASE_PATH")]
    database: Option<String>,

    /// Override the probability of corrupting an operation (0.0 to 1.0)
    #[arg(long)]
    chaos_rate: Option<f64>,

    /// Disable chaos entirely (the store behaves honestly)
    #[arg(long)]
    no_chaos: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a key
    Put {
        /// Key to store under
        key: String,
        /// Value to store
        value: String,
    },

    /// Fetch the value for a key
    Get {
        /// Key to fetch
        key: String,
    },

    /// Delete the record for a key
    Delete {
        /// Key to delete
        key: String,
    },

    /// Print the true backend state, ordered by key
    Dump,

    /// Insert the canonical seed records
    Seed,

    /// Run a guided walk-through of puts, gets, and deletes
    Demo,

    /// Keep mutating random records until interrupted
    Watch {
        /// Seconds between mutations
        #[arg(short, long, default_value = "10")]
        interval: u64,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load().map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    if let Some(rate) = cli.chaos_rate {
        config.chaos.chaos_rate = rate;
    }
    if cli.no_chaos {
        config.chaos.enabled = false;
    }

    let db = shared_database(&AsyncDatabaseConfig::from(&config.database)).await?;
    let backend = Arc::new(SqlxKvBackend::new(db));
    let engine = ChaosEngine::new(config.chaos.policy());
    let store = ChaosKvStore::new(backend, engine);

    let mut exit_code = 0;
    match cli.command {
        Commands::Put { key, value } => {
            store.put(&key, &value).await?;
            println!("Put successful");
            commands::print_chaos_note(&store);
        },

        Commands::Get { key } => {
            exit_code = commands::run_get(&store, &key).await;
        },

        Commands::Delete { key } => {
            store.delete(&key).await?;
            println!("Delete successful");
            commands::print_chaos_note(&store);
        },

        Commands::Dump => {
            commands::run_dump(&store).await?;
        },

        Commands::Seed => {
            commands::run_seed(&store).await?;
        },

        Commands::Demo => {
            commands::run_demo(&store).await?;
        },

        Commands::Watch { interval } => {
            commands::run_watch(&store, interval).await?;
        },
    }

    // Teardown happens on every path, including a failed get
    db.close().await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
