//! tally-server - main entry point

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tally_config::{init_logging, Settings};
use tally_server::{app, AppState};
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(name = "tally-server")]
#[command(about = "Serve customer/order reconciliation over HTTP")]
#[command(version)]
struct Args {
    /// Bind address (default: settings [server] host)
    #[arg(long, env = "TALLY_HOST")]
    host: Option<String>,

    /// Bind port (default: settings [server] port)
    #[arg(long, env = "TALLY_PORT")]
    port: Option<u16>,

    /// Settings file (default: <config dir>/tally/settings.toml)
    #[arg(long, env = "TALLY_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    init_logging(&settings.log.clone().with_env_overrides()?)?;

    let host = args.host.unwrap_or(settings.server.host);
    let port = args.port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    let router = app(AppState::default(), settings.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "tally-server listening on {} (uploads up to {} bytes)",
        addr, settings.server.max_upload_bytes
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
