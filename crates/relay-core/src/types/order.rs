//! Order types sent to the broker.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Lot size used when neither the alert nor the robot gives one.
pub const DEFAULT_VOLUME: Decimal = dec!(0.01);

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Operation name the broker API expects.
    pub fn as_operation(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Request to open a market position. There is no price field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub symbol: String,
    pub side: Side,
    pub volume: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub comment: Option<String>,
}

impl OpenOrder {
    /// Create a market order; a missing or non-positive volume becomes
    /// [`DEFAULT_VOLUME`].
    pub fn market(symbol: impl Into<String>, side: Side, volume: Option<Decimal>) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            volume: volume.filter(|v| *v > Decimal::ZERO).unwrap_or(DEFAULT_VOLUME),
            stop_loss: None,
            take_profit: None,
            comment: None,
        }
    }

    pub fn with_stops(mut self, stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// Request to close a position by ticket. The ticket is authoritative, so
/// no symbol or side is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseOrder {
    pub ticket: i64,
    pub volume: Decimal,
}

/// Raw HTTP answer to an order request, interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerReply {
    pub status: u16,
    pub body: String,
}

impl BrokerReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// 200 reply with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_order_volume_fallback() {
        assert_eq!(OpenOrder::market("EURUSD", Side::Buy, None).volume, DEFAULT_VOLUME);
        assert_eq!(
            OpenOrder::market("EURUSD", Side::Buy, Some(Decimal::ZERO)).volume,
            DEFAULT_VOLUME
        );
        assert_eq!(OpenOrder::market("EURUSD", Side::Sell, Some(dec!(0.5))).volume, dec!(0.5));
    }

    #[test]
    fn test_reply_status() {
        assert!(BrokerReply::ok("1").is_success());
        assert!(BrokerReply::new(204, "").is_success());
        assert!(!BrokerReply::new(400, "bad").is_success());
        assert_eq!(Side::Sell.as_operation(), "Sell");
    }
}
