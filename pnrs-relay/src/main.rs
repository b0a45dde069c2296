//! pnrs-relay - Phone Number Relay Service
//!
//! Copies person records matching a list of phone numbers from a source
//! collection into a destination collection under an investigation id, and
//! serves them back over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pnrs_common::config::{CliOverrides, RelayConfig, StoreConfig};
use pnrs_common::db::{connect, connect_readonly};
use pnrs_common::{Collection, CollectionRole};
use pnrs_relay::{build_router, get_by_investigation, transfer, AppState};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for pnrs-relay
#[derive(Parser, Debug)]
#[command(name = "pnrs-relay")]
#[command(about = "Phone number relay service")]
#[command(version)]
struct Args {
    /// TOML config file (overrides PNRS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source database file
    #[arg(long, global = true)]
    source_db: Option<PathBuf>,

    /// Source collection name
    #[arg(long, global = true)]
    source_collection: Option<String>,

    /// Destination database file
    #[arg(long, global = true)]
    destination_db: Option<PathBuf>,

    /// Destination collection name
    #[arg(long, global = true)]
    destination_collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5790
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Copy records for the given phone numbers into an investigation
    Transfer {
        /// Investigation id to tag the copies with
        #[arg(short, long)]
        invest_id: String,

        /// Phone numbers to look up in the source collection
        phones: Vec<String>,
    },
    /// Print every record of an investigation
    Show {
        invest_id: String,
    },
    /// Print the source records matching the given phone numbers
    Lookup {
        phones: Vec<String>,
    },
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let bind = match &self.command {
            Command::Serve { bind } => bind.clone(),
            _ => None,
        };

        CliOverrides {
            config: self.config.clone(),
            source_db: self.source_db.clone(),
            source_collection: self.source_collection.clone(),
            destination_db: self.destination_db.clone(),
            destination_collection: self.destination_collection.clone(),
            bind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = RelayConfig::resolve(&args.overrides()).context("Failed to load configuration")?;

    // Logs go to stderr so command output on stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting pnrs-relay v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config.config_file {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let source = open_collection(&config.source, CollectionRole::Source).await?;
    let destination = open_collection(&config.destination, CollectionRole::Destination).await?;

    match args.command {
        Command::Serve { .. } => serve(&config.bind, AppState::new(source, destination)).await,
        Command::Transfer { invest_id, phones } => {
            let report = transfer(&source, &destination, &phones, &invest_id).await?;
            print_json(&report)
        }
        Command::Show { invest_id } => {
            let records = get_by_investigation(&destination, &invest_id).await?;
            print_json(&records)
        }
        Command::Lookup { phones } => {
            let records = source.find_by_phones(&phones).await?;
            print_json(&records)
        }
    }
}

async fn open_collection(store: &StoreConfig, role: CollectionRole) -> Result<Collection> {
    // The source store is managed elsewhere and must already exist
    let pool = match role {
        CollectionRole::Source => connect_readonly(&store.database).await,
        CollectionRole::Destination => connect(&store.database).await,
    }
    .with_context(|| format!("Failed to open database {}", store.database.display()))?;

    let collection = Collection::open(pool, &store.collection, role)
        .await
        .with_context(|| format!("Failed to open collection '{}'", store.collection))?;

    Ok(collection)
}

async fn serve(bind: &str, state: AppState) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("pnrs-relay listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// A handler that cannot be installed is logged and then never fires, so the
/// server keeps running on whichever signal is still available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    info!("Received {}, shutting down", signal_name);
}
