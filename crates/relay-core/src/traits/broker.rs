//! Broker API trait definition.

use crate::error::BrokerError;
use crate::types::{BrokerCredentials, BrokerReply, CloseOrder, OpenOrder, OpenPosition, Quote};
use async_trait::async_trait;

/// Trait for the broker's trading API.
///
/// Every call carries the account's credentials; implementations hold no
/// per-account state. Order calls return the raw reply so the engine can
/// interpret the broker's mixed response formats in one place.
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// List every tradable symbol, in the broker's native order.
    async fn symbols(&self, credentials: &BrokerCredentials) -> Result<Vec<String>, BrokerError>;

    /// Get a bid/ask snapshot.
    ///
    /// # Returns
    /// `BrokerError::Unavailable` unless both bid and ask are numeric
    async fn quote(&self, symbol: &str, credentials: &BrokerCredentials) -> Result<Quote, BrokerError>;

    /// Subscribe the feed to a symbol.
    async fn subscribe(&self, symbol: &str, credentials: &BrokerCredentials) -> Result<(), BrokerError>;

    /// List open positions and pending orders.
    async fn open_positions(
        &self,
        credentials: &BrokerCredentials,
    ) -> Result<Vec<OpenPosition>, BrokerError>;

    /// Send a market order.
    ///
    /// # Returns
    /// The raw HTTP reply for any status; `Err` only when no reply arrived
    async fn order_send(
        &self,
        order: &OpenOrder,
        credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError>;

    /// Close a position by ticket.
    async fn order_close(
        &self,
        order: &CloseOrder,
        credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;
}
