//! twiliodb-sync binary entry point.
//!
//! Usage:
//! ```bash
//! twiliodb-sync --config twiliodb.toml
//! twiliodb-sync --once
//! twiliodb-sync --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use twiliodb_sync_daemon::{daemon, Config};

/// Mirror a telephony account into a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "twiliodb-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "twiliodb.toml")]
    config: PathBuf,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_file(&cli.config)
        .context("Failed to load configuration")?
        .with_env_auth_token();
    if cli.once {
        config.sync.one_shot = true;
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "twiliodb-sync starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown_tx.send_replace(true);
        }
    });

    let cycles = daemon::run(config, shutdown_rx)
        .await
        .context("Sync daemon failed")?;
    tracing::info!(cycles, "twiliodb-sync stopped");
    Ok(())
}
