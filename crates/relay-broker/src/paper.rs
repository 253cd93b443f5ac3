//! Paper broker for simulation and testing.

use async_trait::async_trait;
use relay_core::error::BrokerError;
use relay_core::traits::BrokerApi;
use relay_core::types::{BrokerCredentials, BrokerReply, CloseOrder, OpenOrder, OpenPosition, Quote};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct PaperState {
    universe: Option<Vec<String>>,
    positions: Vec<OpenPosition>,
    quotes: HashMap<String, Quote>,
    send_replies: VecDeque<Result<BrokerReply, BrokerError>>,
    close_replies: HashMap<i64, Result<BrokerReply, BrokerError>>,
    positions_error: Option<BrokerError>,
    subscribe_fails: bool,
    next_ticket: i64,
    calls: Vec<String>,
}

/// In-memory broker.
///
/// Opens and closes positions locally unless a reply has been scripted, and
/// records every call so callers can check what reached the broker.
#[derive(Clone)]
pub struct PaperBroker {
    state: Arc<Mutex<PaperState>>,
}

impl PaperBroker {
    /// Create a paper broker listing the given symbols.
    pub fn new<S: Into<String>>(universe: impl IntoIterator<Item = S>) -> Self {
        let state = PaperState {
            universe: Some(universe.into_iter().map(Into::into).collect()),
            next_ticket: 1000,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, PaperState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the symbol listing fail.
    pub fn with_unavailable_universe(self) -> Self {
        self.state().universe = None;
        self
    }

    pub fn with_position(self, position: OpenPosition) -> Self {
        self.state().positions.push(position);
        self
    }

    pub fn with_quote(self, symbol: &str, bid: f64, ask: f64) -> Self {
        self.state().quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                bid,
                ask,
            },
        );
        self
    }

    /// Queue the reply for the next order send.
    pub fn with_send_reply(self, reply: Result<BrokerReply, BrokerError>) -> Self {
        self.state().send_replies.push_back(reply);
        self
    }

    /// Script the reply for closing a ticket.
    pub fn with_close_reply(self, ticket: i64, reply: Result<BrokerReply, BrokerError>) -> Self {
        self.state().close_replies.insert(ticket, reply);
        self
    }

    pub fn with_positions_error(self, error: BrokerError) -> Self {
        self.state().positions_error = Some(error);
        self
    }

    pub fn with_failing_subscribe(self) -> Self {
        self.state().subscribe_fails = true;
        self
    }

    /// Calls made so far, e.g. `"order_send XAUUSD Buy 0.01"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Positions currently open.
    pub fn positions(&self) -> Vec<OpenPosition> {
        self.state().positions.clone()
    }
}

#[async_trait]
impl BrokerApi for PaperBroker {
    async fn symbols(&self, _credentials: &BrokerCredentials) -> Result<Vec<String>, BrokerError> {
        let mut state = self.state();
        state.calls.push("symbols".to_string());
        state
            .universe
            .clone()
            .ok_or_else(|| BrokerError::Connection("symbol list unavailable".into()))
    }

    async fn quote(&self, symbol: &str, _credentials: &BrokerCredentials) -> Result<Quote, BrokerError> {
        let mut state = self.state();
        state.calls.push(format!("quote {symbol}"));
        state
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::Unavailable(format!("no quote for {symbol}")))
    }

    async fn subscribe(&self, symbol: &str, _credentials: &BrokerCredentials) -> Result<(), BrokerError> {
        let mut state = self.state();
        state.calls.push(format!("subscribe {symbol}"));
        if state.subscribe_fails {
            return Err(BrokerError::ApiError {
                status: 400,
                body: format!("cannot subscribe {symbol}"),
            });
        }
        Ok(())
    }

    async fn open_positions(
        &self,
        _credentials: &BrokerCredentials,
    ) -> Result<Vec<OpenPosition>, BrokerError> {
        let mut state = self.state();
        state.calls.push("open_positions".to_string());
        if let Some(err) = &state.positions_error {
            return Err(err.clone());
        }
        Ok(state.positions.clone())
    }

    async fn order_send(
        &self,
        order: &OpenOrder,
        _credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError> {
        let mut state = self.state();
        state.calls.push(format!(
            "order_send {} {} {}",
            order.symbol,
            order.side.as_operation(),
            order.volume
        ));

        if let Some(reply) = state.send_replies.pop_front() {
            return reply;
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state
            .positions
            .push(OpenPosition::new(ticket, order.symbol.clone(), order.side, order.volume));
        Ok(BrokerReply::ok(ticket.to_string()))
    }

    async fn order_close(
        &self,
        order: &CloseOrder,
        _credentials: &BrokerCredentials,
    ) -> Result<BrokerReply, BrokerError> {
        let mut state = self.state();
        state.calls.push(format!("order_close {} {}", order.ticket, order.volume));

        if let Some(reply) = state.close_replies.remove(&order.ticket) {
            if matches!(&reply, Ok(r) if r.is_success()) {
                state.positions.retain(|p| p.ticket != order.ticket);
            }
            return reply;
        }

        let before = state.positions.len();
        state.positions.retain(|p| p.ticket != order.ticket);
        if state.positions.len() == before {
            return Ok(BrokerReply::new(404, format!("Ticket {} not found", order.ticket)));
        }
        Ok(BrokerReply::ok(format!(r#"{{"retcode":10009,"ticket":{}}}"#, order.ticket)))
    }

    fn name(&self) -> &str {
        "Paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::{AccountClass, Side};
    use rust_decimal_macros::dec;

    fn credentials() -> BrokerCredentials {
        BrokerCredentials {
            account_id: "1".into(),
            server_name: "Paper".into(),
            session_token: "t".into(),
            account_class: AccountClass::Demo,
        }
    }

    #[tokio::test]
    async fn test_paper_broker_open_and_close() {
        let broker = PaperBroker::new(["EURUSD"]);

        let order = OpenOrder::market("EURUSD", Side::Buy, Some(dec!(0.1)));
        let reply = broker.order_send(&order, &credentials()).await.unwrap();
        assert_eq!(reply.body, "1000");

        let positions = broker.open_positions(&credentials()).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].volume, dec!(0.1));

        let close = CloseOrder { ticket: 1000, volume: dec!(0.1) };
        assert!(broker.order_close(&close, &credentials()).await.unwrap().is_success());
        assert!(broker.positions().is_empty());

        let again = broker.order_close(&close, &credentials()).await.unwrap();
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn test_paper_broker_records_calls() {
        let broker = PaperBroker::new(Vec::<String>::new())
            .with_unavailable_universe()
            .with_failing_subscribe();

        assert!(broker.symbols(&credentials()).await.is_err());
        assert!(broker.subscribe("EURUSD", &credentials()).await.is_err());
        assert_eq!(broker.calls(), vec!["symbols", "subscribe EURUSD"]);
    }
}
