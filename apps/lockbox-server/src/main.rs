mod config;
mod handlers;
mod metrics;
mod server;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use lockbox_sharing::Sharing;
use lockbox_storage::Store;
use lockbox_store_sqlite::SqliteStore;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use config::ServerConfig;
use server::{api_router, health_router, AppState, ReadinessCheck};

const DEFAULT_DATABASE_URL: &str = "sqlite://lockbox.db?mode=rwc";

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "lockbox-server")]
#[command(about = "Lockbox group and category sharing server")]
struct Cli {
    /// Database URL (sqlite://path/to/lockbox.db?mode=rwc)
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve {
        /// API server address
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,

        /// Health check and metrics HTTP server address
        #[arg(long, default_value = "0.0.0.0:8080")]
        health_addr: String,
    },
    /// Maintenance commands
    Maintenance {
        #[command(subcommand)]
        maintenance_cmd: MaintenanceCommand,
    },
}

#[derive(Subcommand)]
enum MaintenanceCommand {
    /// Delete category shares whose group no longer exists
    SweepShares,
}

// ────────────────────────────────────── Commands ──────────────────────────────────────

async fn cmd_serve(
    database_url: &str,
    addr: &str,
    health_addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let store = Arc::new(SqliteStore::open(database_url).await?);
    let metrics_handle = config.metrics_enabled.then(metrics::init_metrics);

    let state = AppState::new(store.clone() as Arc<dyn Store>, &config);
    let api = api_router(state, &config);

    let (readiness_tx, readiness_rx) = watch::channel(false);
    let health = health_router(ReadinessCheck::new(readiness_rx), metrics_handle);

    let api_listener = tokio::net::TcpListener::bind(addr).await?;
    let health_listener = tokio::net::TcpListener::bind(health_addr).await?;

    tracing::info!(addr = %api_listener.local_addr()?, "API server listening");
    tracing::info!(addr = %health_listener.local_addr()?, "health checks listening");

    let _ = readiness_tx.send(true);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal(Some(readiness_tx)).await;
        let _ = shutdown_tx_clone.send(());
    });

    let mut shutdown_rx1 = shutdown_tx.subscribe();
    let api_server = axum::serve(api_listener, api).with_graceful_shutdown(async move {
        let _ = shutdown_rx1.recv().await;
    });

    let mut shutdown_rx2 = shutdown_tx.subscribe();
    let health_server = axum::serve(health_listener, health).with_graceful_shutdown(async move {
        let _ = shutdown_rx2.recv().await;
    });

    let (api_result, health_result) = tokio::join!(api_server, health_server);

    store.close().await;
    tracing::info!("server stopped");

    api_result?;
    health_result?;

    Ok(())
}

async fn cmd_sweep_shares(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open(database_url).await?);
    let removed = Sharing::new(store.clone()).sweep_orphaned_shares().await;
    store.close().await;

    println!("Removed {} orphaned category shares", removed?);
    Ok(())
}

async fn shutdown_signal(readiness_tx: Option<watch::Sender<bool>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down gracefully");
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, shutting down gracefully");
        }
    }

    // Stop advertising readiness so traffic drains before the listeners close.
    if let Some(tx) = readiness_tx {
        let _ = tx.send(false);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr, health_addr } => {
            cmd_serve(&cli.database_url, &addr, &health_addr).await?;
        }
        Command::Maintenance { maintenance_cmd } => match maintenance_cmd {
            MaintenanceCommand::SweepShares => {
                cmd_sweep_shares(&cli.database_url).await?;
            }
        },
    }

    Ok(())
}
