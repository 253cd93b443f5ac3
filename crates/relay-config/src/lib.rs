//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, BrokerSettings, LoggingConfig, ServerConfig, StoreSettings};

use config::{Config, Environment, File};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from an optional file and `RELAY__`-prefixed
/// environment variables, e.g. `RELAY__BROKER__BASE_URL`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigLoadError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

/// Reject settings the relay cannot start with.
pub fn validate(config: &AppConfig) -> Result<(), ConfigLoadError> {
    config.server.socket_addr().map_err(ConfigLoadError::Invalid)?;

    if !config.server.webhook_path.starts_with('/') {
        return Err(ConfigLoadError::Invalid(format!(
            "server.webhook_path must start with '/': {:?}",
            config.server.webhook_path
        )));
    }
    if config.server.webhook_path == "/health" {
        return Err(ConfigLoadError::Invalid(
            "server.webhook_path cannot be /health".to_string(),
        ));
    }

    let url = config.broker.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigLoadError::Invalid(format!(
            "broker.base_url must be an http(s) URL: {url:?}"
        )));
    }
    if config.broker.timeout_secs == 0 {
        return Err(ConfigLoadError::Invalid(
            "broker.timeout_secs must be positive".to_string(),
        ));
    }
    if config.store.retention == 0 {
        return Err(ConfigLoadError::Invalid(
            "store.retention must be positive".to_string(),
        ));
    }
    Ok(())
}
