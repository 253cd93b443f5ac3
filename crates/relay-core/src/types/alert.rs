//! Inbound alert types and validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::RelayError;
use crate::json;

/// What an alert asks the broker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertAction {
    /// Open a market buy position
    OpenBuy,
    /// Open a market sell position
    OpenSell,
    /// Close by ticket, or every position on the symbol
    Close,
}

impl AlertAction {
    /// Side of the order to open, `None` for a close.
    pub fn open_side(&self) -> Option<super::Side> {
        match self {
            AlertAction::OpenBuy => Some(super::Side::Buy),
            AlertAction::OpenSell => Some(super::Side::Sell),
            AlertAction::Close => None,
        }
    }
}

impl FromStr for AlertAction {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN_BUY" | "BUY" => Ok(AlertAction::OpenBuy),
            "OPEN_SELL" | "SELL" => Ok(AlertAction::OpenSell),
            "CLOSE" => Ok(AlertAction::Close),
            other => Err(RelayError::ClientInput(format!("unsupported action: {other}"))),
        }
    }
}

impl std::fmt::Display for AlertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertAction::OpenBuy => write!(f, "OPEN_BUY"),
            AlertAction::OpenSell => write!(f, "OPEN_SELL"),
            AlertAction::Close => write!(f, "CLOSE"),
        }
    }
}

/// A validated trading instruction. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub action: AlertAction,
    /// Lot size, always positive when present
    pub volume: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub strategy_tag: Option<String>,
    /// Ticket to close, always positive when present
    pub target_ticket: Option<i64>,
}

impl Alert {
    /// Create an alert with only the required fields set.
    pub fn new(symbol: impl Into<String>, action: AlertAction) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            volume: None,
            stop_loss: None,
            take_profit: None,
            strategy_tag: None,
            target_ticket: None,
        }
    }
}

/// Raw webhook body as sent by the charting platform.
///
/// Numeric fields are kept as JSON values because senders mix numbers and
/// numeric strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub symbol: Option<String>,
    pub action: Option<String>,
    pub volume: Option<Value>,
    #[serde(alias = "sl")]
    pub stop_loss: Option<Value>,
    #[serde(alias = "tp")]
    pub take_profit: Option<Value>,
    #[serde(alias = "strategy", alias = "comment")]
    pub strategy_tag: Option<String>,
    #[serde(alias = "ticket")]
    pub target_ticket: Option<Value>,
    #[serde(alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(alias = "bot_id", alias = "robotId")]
    pub bot_id: Option<String>,
    /// Accepted and ignored: orders are always market orders.
    pub price: Option<Value>,
}

/// An alert together with who sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundAlert {
    pub alert: Alert,
    pub user_id: String,
    pub bot_id: Option<String>,
}

impl AlertPayload {
    /// Check the payload shape and build the immutable alert.
    ///
    /// Runs before any side effect; every failure is a client error.
    pub fn validate(&self) -> Result<InboundAlert, RelayError> {
        let symbol = non_empty(self.symbol.as_deref().map(strip_exchange_prefix))
            .ok_or_else(|| RelayError::ClientInput("symbol is required".into()))?;
        let action: AlertAction = non_empty(self.action.as_deref())
            .ok_or_else(|| RelayError::ClientInput("action is required".into()))?
            .parse()?;
        let user_id = non_empty(self.user_id.as_deref())
            .ok_or_else(|| RelayError::ClientInput("userId is required".into()))?;

        let volume = optional_decimal(self.volume.as_ref(), "volume")?;
        if matches!(volume, Some(v) if v <= Decimal::ZERO) {
            return Err(RelayError::ClientInput("volume must be positive".into()));
        }

        let target_ticket = match self.target_ticket.as_ref().filter(|v| !is_blank(v)) {
            None => None,
            Some(v) => match json::integer(v) {
                Some(t) if t > 0 => Some(t),
                _ => {
                    return Err(RelayError::ClientInput(
                        "targetTicket must be a positive integer".into(),
                    ))
                }
            },
        };

        let alert = Alert {
            symbol: symbol.to_string(),
            action,
            volume,
            stop_loss: optional_decimal(self.stop_loss.as_ref(), "stopLoss")?,
            take_profit: optional_decimal(self.take_profit.as_ref(), "takeProfit")?,
            strategy_tag: non_empty(self.strategy_tag.as_deref()).map(str::to_string),
            target_ticket,
        };

        Ok(InboundAlert {
            alert,
            user_id: user_id.to_string(),
            bot_id: non_empty(self.bot_id.as_deref()).map(str::to_string),
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn is_blank(v: &Value) -> bool {
    v.is_null() || matches!(v, Value::String(s) if s.trim().is_empty())
}

fn optional_decimal(value: Option<&Value>, name: &str) -> Result<Option<Decimal>, RelayError> {
    match value.filter(|v| !is_blank(v)) {
        None => Ok(None),
        Some(v) => json::decimal(v)
            .map(Some)
            .ok_or_else(|| RelayError::ClientInput(format!("{name} must be numeric"))),
    }
}

/// `OANDA:XAUUSD` -> `XAUUSD`
fn strip_exchange_prefix(symbol: &str) -> &str {
    symbol.rsplit(':').next().unwrap_or(symbol).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn payload(value: Value) -> AlertPayload {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case("OPEN_BUY", AlertAction::OpenBuy)]
    #[case("buy", AlertAction::OpenBuy)]
    #[case("open_sell", AlertAction::OpenSell)]
    #[case("SELL", AlertAction::OpenSell)]
    #[case(" close ", AlertAction::Close)]
    fn test_action_aliases(#[case] raw: &str, #[case] expected: AlertAction) {
        assert_eq!(raw.parse::<AlertAction>().unwrap(), expected);
    }

    #[test]
    fn test_hold_is_rejected() {
        let err = payload(json!({"symbol": "EURUSD", "action": "HOLD", "userId": "u1"}))
            .validate()
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_missing_required_fields() {
        for body in [
            json!({"action": "BUY", "userId": "u1"}),
            json!({"symbol": "EURUSD", "userId": "u1"}),
            json!({"symbol": "EURUSD", "action": "BUY"}),
            json!({"symbol": "  ", "action": "BUY", "userId": "u1"}),
            json!({"symbol": "", "action": "BUY", "userId": "u1"}),
            json!({"symbol": "OANDA:", "action": "BUY", "userId": "u1"}),
            json!({"symbol": "OANDA: ", "action": "CLOSE", "userId": "u1"}),
        ] {
            assert!(payload(body).validate().unwrap_err().is_client_error());
        }
    }

    #[test]
    fn test_full_payload_with_aliases() {
        let inbound = payload(json!({
            "symbol": "OANDA:XAUUSD",
            "action": "buy",
            "volume": "0.2",
            "sl": 1900.5,
            "tp": "2000",
            "strategy": "breakout",
            "user_id": "u1",
            "botId": "bot-7",
            "price": 1950.1
        }))
        .validate()
        .unwrap();

        assert_eq!(inbound.user_id, "u1");
        assert_eq!(inbound.bot_id.as_deref(), Some("bot-7"));
        assert_eq!(inbound.alert.symbol, "XAUUSD");
        assert_eq!(inbound.alert.action, AlertAction::OpenBuy);
        assert_eq!(inbound.alert.volume, Some(dec!(0.2)));
        assert_eq!(inbound.alert.stop_loss, Some(dec!(1900.5)));
        assert_eq!(inbound.alert.take_profit, Some(dec!(2000)));
        assert_eq!(inbound.alert.strategy_tag.as_deref(), Some("breakout"));
    }

    #[test]
    fn test_non_positive_volume_and_ticket_rejected() {
        let zero = payload(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u", "volume": 0}));
        assert!(zero.validate().is_err());

        let ticket = payload(json!({"symbol": "EURUSD", "action": "CLOSE", "userId": "u", "ticket": -3}));
        assert!(ticket.validate().is_err());

        let ok = payload(json!({"symbol": "EURUSD", "action": "CLOSE", "userId": "u", "ticket": "991"}));
        assert_eq!(ok.validate().unwrap().alert.target_ticket, Some(991));
    }
}
