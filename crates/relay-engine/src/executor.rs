//! Opening and closing market positions.

use relay_core::traits::BrokerApi;
use relay_core::types::{
    BrokerCredentials, CloseOrder, ExecutionOutcome, OpenOrder, OpenPosition, Side, DEFAULT_VOLUME,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::interpreter::ResponseInterpreter;
use crate::locator::{by_symbol_and_side, by_ticket, PositionLocator};

/// Sends open and close orders and turns replies into outcomes.
#[derive(Clone)]
pub struct OrderExecutor {
    broker: Arc<dyn BrokerApi>,
    locator: PositionLocator,
    interpreter: ResponseInterpreter,
}

impl OrderExecutor {
    pub fn new(broker: Arc<dyn BrokerApi>) -> Self {
        Self {
            locator: PositionLocator::new(broker.clone()),
            broker,
            interpreter: ResponseInterpreter::new(),
        }
    }

    /// Open a market position on an already-resolved symbol.
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        &self,
        symbol: &str,
        side: Side,
        volume: Option<Decimal>,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        comment: Option<String>,
        credentials: &BrokerCredentials,
    ) -> ExecutionOutcome {
        let order = OpenOrder::market(symbol, side, volume)
            .with_stops(stop_loss, take_profit)
            .with_comment(comment);
        self.send(&order, credentials).await
    }

    /// Send a prepared market order.
    pub async fn send(&self, order: &OpenOrder, credentials: &BrokerCredentials) -> ExecutionOutcome {
        let reply = match self.broker.order_send(order, credentials).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Order send for {} failed: {}", order.symbol, e);
                return ExecutionOutcome::failure(e.to_string());
            }
        };

        let result = self.interpreter.interpret(&reply);
        if !result.success {
            warn!("{} {} {} rejected: {}", order.side, order.volume, order.symbol, result.message);
            return ExecutionOutcome::failure(result.message);
        }

        info!(
            "Opened {} {} {} (ticket {:?})",
            order.side, order.volume, order.symbol, result.order_id
        );
        let mut outcome = ExecutionOutcome::success(format!(
            "Opened {} {} {}: {}",
            order.side, order.volume, order.symbol, result.message
        ))
        .with_profit(result.profit.unwrap_or(Decimal::ZERO));
        outcome.order_id = result.order_id;
        outcome
    }

    /// Close one position by its ticket and known lot size.
    pub async fn close(&self, position: &OpenPosition, credentials: &BrokerCredentials) -> ExecutionOutcome {
        let volume = if position.volume > Decimal::ZERO {
            position.volume
        } else {
            DEFAULT_VOLUME
        };
        let order = CloseOrder {
            ticket: position.ticket,
            volume,
        };

        let reply = match self.broker.order_close(&order, credentials).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Close of ticket {} failed: {}", position.ticket, e);
                return ExecutionOutcome::failure(e.to_string());
            }
        };

        let result = self.interpreter.interpret(&reply);
        if !result.success {
            warn!("Close of ticket {} rejected: {}", position.ticket, result.message);
            return ExecutionOutcome::failure(result.message);
        }

        let profit = result
            .profit
            .or(position.profit)
            .unwrap_or(Decimal::ZERO);
        info!("Closed ticket {} {} with profit {}", position.ticket, position.symbol, profit);
        ExecutionOutcome::success(format!("Closed ticket {} {}", position.ticket, position.symbol))
            .with_order_id(position.ticket)
            .with_profit(profit)
    }

    /// Close the position with `ticket`.
    ///
    /// A ticket that is no longer open counts as success: a close racing an
    /// earlier close is expected.
    pub async fn close_by_ticket(&self, ticket: i64, credentials: &BrokerCredentials) -> ExecutionOutcome {
        let positions = match self.locator.list_open_positions(credentials).await {
            Ok(positions) => positions,
            Err(e) => return e.into(),
        };

        match by_ticket(&positions, ticket) {
            Some(position) => self.close(position, credentials).await,
            None => {
                info!("Ticket {} not open, treating as already closed", ticket);
                ExecutionOutcome::success(format!(
                    "Position {ticket} not found, already closed"
                ))
                .with_order_id(ticket)
                .with_profit(Decimal::ZERO)
            }
        }
    }

    /// Close every BUY/SELL position on `symbol`, one at a time.
    ///
    /// Individual failures do not stop the batch; the batch succeeds when at
    /// least one position closed and profit sums only the closed ones.
    pub async fn close_all(&self, symbol: &str, credentials: &BrokerCredentials) -> ExecutionOutcome {
        let positions = match self.locator.list_open_positions(credentials).await {
            Ok(positions) => positions,
            Err(e) => return e.into(),
        };

        let matching = by_symbol_and_side(&positions, symbol);
        if matching.is_empty() {
            return ExecutionOutcome::failure(format!("No open positions for symbol {symbol}"));
        }

        let total = matching.len();
        let mut closed = 0usize;
        let mut profit = Decimal::ZERO;
        let mut errors = Vec::new();

        for position in matching {
            let outcome = self.close(position, credentials).await;
            if outcome.success {
                closed += 1;
                profit += outcome.profit.unwrap_or(Decimal::ZERO);
            } else {
                errors.push(format!("ticket {}: {}", position.ticket, outcome.message));
            }
        }

        info!("Closed {} of {} positions for {}", closed, total, symbol);
        let mut message = format!("Closed {closed} of {total} positions for {symbol}");
        if !errors.is_empty() {
            message.push_str(&format!(" (failed: {})", errors.join("; ")));
        }

        if closed > 0 {
            ExecutionOutcome::success(message).with_profit(profit)
        } else {
            ExecutionOutcome::failure(message)
        }
    }
}
