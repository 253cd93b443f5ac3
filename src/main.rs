//! Alert relay CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use relay_config::load_config;
use relay_monitor::setup_logging;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref());
    if matches!(cli.command, Commands::ValidateConfig) {
        return cli::commands::validate::run(cli.config.as_deref(), loaded);
    }
    let config = loaded.context("Failed to load configuration")?;

    // Setup logging
    let log_level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let _guard = setup_logging(
        &log_level,
        cli.json_logs || config.logging.is_json(),
        config.logging.file.as_deref().map(Path::new),
    );

    // Execute command
    match cli.command {
        Commands::Serve(args) => cli::commands::serve::run(args, config).await,
        Commands::Resolve(args) => cli::commands::resolve::run(args, config).await,
        Commands::Positions(args) => cli::commands::positions::run(args, config).await,
        Commands::ValidateConfig => Ok(()),
    }
}
