use anyhow::{Context, Result};
use clap::Parser;
use mdvault_config::ConfigLoader;
use mdvault_core::Vault;
use mdvault_tools::VaultMcpServer;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = ConfigLoader::new()
        .with_file(cli.config.clone())
        .with_overrides(cli.overrides())
        .load()
        .context("Failed to load configuration")?;

    info!("Starting mdvault MCP server");
    info!("  Vault path: {}", config.vault_path.display());
    info!("  Daily notes: {}", config.daily_note_format);
    info!("  Vault CLI: {}", config.cli_binary);

    let vault = Vault::with_settings(
        &config.vault_path,
        config.daily_note_format,
        config.cli_binary,
    )
    .context("Failed to open vault")?;

    VaultMcpServer::new(vault).serve_stdio().await
}

/// Logs go to stderr or a file; stdout carries the protocol.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = match cli.log_level {
        Some(level) => EnvFilter::default().add_directive(LevelFilter::from(level).into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
