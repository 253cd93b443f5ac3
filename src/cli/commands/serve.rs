//! Webhook server command.

use anyhow::{Context, Result};
use relay_broker::PaperBroker;
use relay_config::AppConfig;
use relay_core::traits::{BrokerApi, Persistence};
use relay_engine::SignalOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::ServeArgs;

pub async fn run(args: ServeArgs, config: AppConfig) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address {bind:?}"))?;

    let broker: Arc<dyn BrokerApi> = if args.paper.is_empty() {
        info!("Broker API: {}", config.broker.base_url);
        Arc::new(super::http_broker(&config)?)
    } else {
        warn!("Paper broker enabled, no orders reach a real broker");
        Arc::new(PaperBroker::new(args.paper))
    };
    let store: Arc<dyn Persistence> = Arc::new(super::open_store(&config)?);

    let orchestrator = SignalOrchestrator::new(broker, store.clone());
    let app = relay_server::router(orchestrator, store, &config.server.webhook_path);

    info!(
        "{} ({}) accepting alerts on {}",
        config.app.name, config.app.environment, config.server.webhook_path
    );
    relay_server::serve(addr, app)
        .await
        .context("Webhook server stopped")
}
