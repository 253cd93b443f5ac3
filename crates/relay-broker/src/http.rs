//! HTTP client for the broker's GET-based trading API.

use async_trait::async_trait;
use relay_core::error::BrokerError;
use relay_core::traits::BrokerApi;
use relay_core::types::{BrokerCredentials, BrokerReply, CloseOrder, OpenOrder, OpenPosition, Quote};
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, info};

use crate::parse::{parse_positions, parse_quote, parse_symbols};

/// Broker API configuration.
#[derive(Debug, Clone)]
pub struct HttpBrokerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Maximum price deviation, in points, tolerated on market orders
    pub slippage: u32,
    pub user_agent: String,
}

impl HttpBrokerConfig {
    /// Create config with default timeout and slippage.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            slippage: 20,
            user_agent: concat!("relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_slippage(mut self, slippage: u32) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Broker client speaking the HTTP trading API.
///
/// The session token travels as the `id` query parameter on every call.
pub struct HttpBroker {
    config: HttpBrokerConfig,
    client: Client,
}

impl HttpBroker {
    /// Create a new broker client.
    pub fn new(config: HttpBrokerConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// GET `path` with the session token and `params`; any status is returned.
    async fn get(
        &self,
        path: &str,
        credentials: &BrokerCredentials,
        params: &[(&str, String)],
    ) -> Result<BrokerReply, BrokerError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

        let resp = self
            .client
            .get(&url)
            .query(&[("id", credentials.session_token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        debug!("GET /{} -> {}: {}", path, status, body);

        Ok(BrokerReply::new(status, body))
    }

    /// Like [`Self::get`] but non-2xx statuses become `ApiError`.
    async fn get_ok(
        &self,
        path: &str,
        credentials: &BrokerCredentials,
        params: &[(&str, String)],
    ) -> Result<String, BrokerError> {
        let reply = self.get(path, credentials, params).await?;
        if !reply.is_success() {
            return Err(BrokerError::ApiError {
                status: reply.status,
                body: reply.body,
            });
        }
        Ok(reply.body)
    }
}

#[async_trait]
impl BrokerApi for HttpBroker {
    async fn symbols(&self, credentials: &BrokerCredentials) -> Result<Vec<String>, BrokerError> {
        let body = self.get_ok("Symbols", credentials, &[]).await?;
        let symbols = parse_symbols(&body)?;
        debug!("Broker universe for {}: {} symbols", credentials.account_id, symbols.len());
        Ok(symbols)
    }

    async fn quote(&self, symbol: &str, credentials: &BrokerCredentials) -> Result<Quote, BrokerError> {
        let body = self
            .get_ok("GetQuote", credentials, &[("symbol", symbol.to_string())])
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        parse_quote(symbol, &body)
    }

    async fn subscribe(&self, symbol: &str, credentials: &BrokerCredentials) -> Result<(), BrokerError> {
        self.get_ok("Subscribe", credentials, &[("symbol", symbol.to_string())])
            .await?;
        Ok(())
    }

    async fn open_positions(
        &self,
        credentials: &BrokerCredentials,
    ) -> Result<Vec<OpenPosition>, BrokerError> {
        let body = self.get_ok("OpenedOrders", credentials, &[]).await?;
        parse_positions(&body)
    }

    async fn order_send(
        &self,
        order: &OpenOrder,
        credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError> {
        let mut params = vec![
            ("symbol", order.symbol.clone()),
            ("operation", order.side.as_operation().to_string()),
            ("volume", order.volume.normalize().to_string()),
            ("slippage", self.config.slippage.to_string()),
        ];
        if let Some(sl) = order.stop_loss {
            params.push(("stoploss", sl.normalize().to_string()));
        }
        if let Some(tp) = order.take_profit {
            params.push(("takeprofit", tp.normalize().to_string()));
        }
        if let Some(comment) = &order.comment {
            params.push(("comment", comment.clone()));
        }

        info!(
            "Sending {} {} {} for account {}",
            order.side, order.volume, order.symbol, credentials.account_id
        );
        self.get("OrderSend", credentials, &params).await
    }

    async fn order_close(
        &self,
        order: &CloseOrder,
        credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError> {
        let params = [
            ("ticket", order.ticket.to_string()),
            ("lots", order.volume.normalize().to_string()),
            ("slippage", self.config.slippage.to_string()),
        ];

        info!("Closing ticket {} ({} lots) for account {}", order.ticket, order.volume, credentials.account_id);
        self.get("OrderClose", credentials, &params).await
    }

    fn name(&self) -> &str {
        "HTTP Broker"
    }
}
