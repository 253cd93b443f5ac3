//! Validate configuration command.

use anyhow::Result;
use relay_config::{AppConfig, ConfigLoadError};
use std::path::Path;

pub fn run(config_path: Option<&Path>, loaded: Result<AppConfig, ConfigLoadError>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("Validating configuration from defaults and environment"),
    }

    match loaded {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Webhook: {}{}", config.server.bind, config.server.webhook_path);
            println!("Broker API: {}", config.broker.base_url);
            println!("Slippage: {} points", config.broker.slippage);
            match &config.store.seed_file {
                Some(path) => println!("Seed file: {:?}", path),
                None => println!("Seed file: none (empty store)"),
            }
            println!("Retention: {} signals", config.store.retention);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
