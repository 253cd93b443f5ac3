//! Quote lookup and feed subscription.

use relay_core::traits::BrokerApi;
use relay_core::types::{BrokerCredentials, Quote};
use tracing::{debug, warn};

/// Fetch a reference quote. `None` when the broker has no numeric bid/ask.
///
/// Orders never use this price; it is logged for diagnostics only.
pub async fn get_quote(
    broker: &dyn BrokerApi,
    symbol: &str,
    credentials: &BrokerCredentials,
) -> Option<Quote> {
    match broker.quote(symbol, credentials).await {
        Ok(quote) => {
            debug!(
                "Quote {}: bid {} ask {} spread {:.5}",
                quote.symbol,
                quote.bid,
                quote.ask,
                quote.spread()
            );
            Some(quote)
        }
        Err(e) => {
            debug!("Quote for {} unavailable: {}", symbol, e);
            None
        }
    }
}

/// Subscribe the feed to `symbol`.
///
/// Failure is soft: some brokers subscribe on the first order anyway.
pub async fn subscribe(
    broker: &dyn BrokerApi,
    symbol: &str,
    credentials: &BrokerCredentials,
) -> bool {
    match broker.subscribe(symbol, credentials).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Subscribe to {} failed, trading anyway: {}", symbol, e);
            false
        }
    }
}
