//! Open position lookup.

use relay_core::error::RelayError;
use relay_core::traits::BrokerApi;
use relay_core::types::{BrokerCredentials, OpenPosition};
use std::sync::Arc;
use tracing::debug;

/// Fetches the account's open positions fresh on every call.
#[derive(Clone)]
pub struct PositionLocator {
    broker: Arc<dyn BrokerApi>,
}

impl PositionLocator {
    pub fn new(broker: Arc<dyn BrokerApi>) -> Self {
        Self { broker }
    }

    /// List open positions in broker order.
    pub async fn list_open_positions(
        &self,
        credentials: &BrokerCredentials,
    ) -> Result<Vec<OpenPosition>, RelayError> {
        let positions = self.broker.open_positions(credentials).await?;
        debug!("{} open entries on account {}", positions.len(), credentials.account_id);
        Ok(positions)
    }
}

/// Position with the given ticket. `None` means it is already closed.
pub fn by_ticket(positions: &[OpenPosition], ticket: i64) -> Option<&OpenPosition> {
    positions.iter().find(|p| p.ticket == ticket)
}

/// BUY and SELL positions on exactly `symbol`; pending orders are skipped.
pub fn by_symbol_and_side<'a>(positions: &'a [OpenPosition], symbol: &str) -> Vec<&'a OpenPosition> {
    positions
        .iter()
        .filter(|p| p.symbol == symbol && p.is_market())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_broker::PaperBroker;
    use relay_core::error::BrokerError;
    use relay_core::types::{AccountClass, Side};
    use rust_decimal_macros::dec;

    fn credentials() -> BrokerCredentials {
        BrokerCredentials {
            account_id: "1".into(),
            server_name: "Paper".into(),
            session_token: "t".into(),
            account_class: AccountClass::Live,
        }
    }

    fn sample() -> Vec<OpenPosition> {
        vec![
            OpenPosition::new(1, "EURUSD", Side::Buy, dec!(0.1)),
            OpenPosition::new(2, "GBPUSD", Side::Sell, dec!(0.2)),
            OpenPosition {
                side: None,
                ..OpenPosition::new(3, "EURUSD", Side::Buy, dec!(1))
            },
            OpenPosition::new(4, "EURUSD", Side::Sell, dec!(0.3)),
        ]
    }

    #[test]
    fn test_by_ticket() {
        let positions = sample();
        assert_eq!(by_ticket(&positions, 2).unwrap().symbol, "GBPUSD");
        assert!(by_ticket(&positions, 99).is_none());
    }

    #[test]
    fn test_by_symbol_and_side_skips_pending() {
        let positions = sample();
        let tickets: Vec<i64> = by_symbol_and_side(&positions, "EURUSD")
            .iter()
            .map(|p| p.ticket)
            .collect();
        assert_eq!(tickets, vec![1, 4]);
        assert!(by_symbol_and_side(&positions, "EURUSD.raw").is_empty());
    }

    #[tokio::test]
    async fn test_list_fails_when_broker_unavailable() {
        let broker = PaperBroker::new(["EURUSD"]).with_positions_error(BrokerError::Parse("bad".into()));
        let locator = PositionLocator::new(Arc::new(broker));
        let err = locator.list_open_positions(&credentials()).await.unwrap_err();
        assert!(matches!(err, RelayError::BrokerUnavailable(_)));
    }
}
