//! CLI command implementations.

pub mod positions;
pub mod resolve;
pub mod serve;
pub mod validate;

use anyhow::{anyhow, Context, Result};
use relay_broker::{HttpBroker, HttpBrokerConfig};
use relay_config::AppConfig;
use relay_core::traits::AccountDirectory;
use relay_core::types::BrokerCredentials;
use relay_store::MemoryStore;

/// HTTP broker client from the `broker` section.
pub fn http_broker(config: &AppConfig) -> Result<HttpBroker> {
    let mut broker_config = HttpBrokerConfig::new(&config.broker.base_url)
        .with_timeout(config.broker.timeout_secs)
        .with_slippage(config.broker.slippage);
    broker_config.user_agent = config.broker.user_agent.clone();
    HttpBroker::new(broker_config).context("Failed to create broker client")
}

/// Store seeded from the `store` section.
pub fn open_store(config: &AppConfig) -> Result<MemoryStore> {
    let store = relay_store::open_store(config.store.seed_file.as_deref())
        .with_context(|| format!("Failed to load seed file {:?}", config.store.seed_file))?;
    Ok(store.with_retention(config.store.retention))
}

/// Credentials of the user's active broker account.
pub async fn credentials(store: &MemoryStore, user: &str) -> Result<BrokerCredentials> {
    let account = store
        .active_account(user)
        .await?
        .ok_or_else(|| anyhow!("No active broker account for {user}"))?;
    account
        .credentials()
        .ok_or_else(|| anyhow!("Broker account {} has no session token", account.id))
}
