//! cadstore CLI
//!
//! Command-line client for the cadstore daemon.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// cadstore - upload and fetch 3D model files
#[derive(Parser, Debug)]
#[command(name = "cadstore")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:5001", global = true)]
    api: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a model file (.stl or .obj)
    Upload {
        /// Path of the file to upload
        path: PathBuf,
    },

    /// List stored models
    List,

    /// Download a stored model
    Get {
        /// Model filename
        name: String,

        /// Output path (defaults to the model name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::ApiClient::new(&cli.api);

    match cli.command {
        Commands::Upload { path } => {
            commands::upload(&client, path).await?;
        }
        Commands::List => {
            commands::list(&client).await?;
        }
        Commands::Get { name, output } => {
            commands::get(&client, name, output).await?;
        }
    }

    Ok(())
}
