//! The single result contract of the engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Outcome of handling one alert. All internal detail collapses into this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            order_id: None,
            profit: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            order_id: None,
            profit: None,
        }
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = Some(profit);
        self
    }
}

impl From<RelayError> for ExecutionOutcome {
    fn from(err: RelayError) -> Self {
        let message = match err {
            // Broker text is surfaced verbatim.
            RelayError::BrokerUnavailable(body) => body,
            other => other.to_string(),
        };
        Self::failure(message)
    }
}
