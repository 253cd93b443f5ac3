//! Open positions as reported by the broker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A position (or pending order) open on the account.
///
/// Always fetched fresh from the broker; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub ticket: i64,
    pub symbol: String,
    /// `None` for pending or other non-market entries
    pub side: Option<Side>,
    pub volume: Decimal,
    /// Floating profit; absent when the broker omits it
    pub profit: Option<Decimal>,
}

impl OpenPosition {
    /// Create a market position.
    pub fn new(ticket: i64, symbol: impl Into<String>, side: Side, volume: Decimal) -> Self {
        Self {
            ticket,
            symbol: symbol.into(),
            side: Some(side),
            volume,
            profit: None,
        }
    }

    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = Some(profit);
        self
    }

    /// Whether this is a live BUY or SELL position.
    pub fn is_market(&self) -> bool {
        self.side.is_some()
    }
}
