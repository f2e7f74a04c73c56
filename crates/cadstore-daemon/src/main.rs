//! cadstore daemon
//!
//! Serves the model store over HTTP.

use anyhow::Context;
use cadstore_api::create_router;
use cadstore_core::DaemonConfig;
use cadstore_store::ModelStore;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// cadstore daemon - upload, list and serve 3D model files
#[derive(Parser, Debug)]
#[command(name = "cadstored")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server
    #[arg(long)]
    address: Option<String>,

    /// Port for the HTTP server
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding uploaded models
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_upload_size: Option<u64>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Load the config file (or defaults) and apply command-line overrides
    fn into_config(self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_file(path)?,
            None => DaemonConfig::default(),
        };

        if let Some(address) = self.address {
            config.api.address = address;
        }
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(path) = self.storage_path {
            config.storage.path = path;
        }
        if let Some(size) = self.max_upload_size {
            config.storage.max_upload_size = size;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        config.storage = config.storage.validate()?;
        Ok(config)
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&config.logging.level))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting cadstore daemon v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(ModelStore::new(config.storage.clone())?);
    store.init().await?;

    let router = create_router(store, &config.api);

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.port)
        .parse()
        .context("Invalid listen address")?;

    info!("API server listening on {}", addr);
    info!(
        path = %config.storage.path.display(),
        max_upload_size = config.storage.max_upload_size,
        "Serving models"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
