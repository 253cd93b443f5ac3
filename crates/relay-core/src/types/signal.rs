//! Signal rows and audit entries kept by the persistence collaborator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Alert, ExecutionOutcome};

/// Signal lifecycle. `Pending` moves to exactly one of the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Pending,
    Executed,
    Failed,
}

impl SignalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Pending)
    }
}

/// One processed alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: Uuid,
    pub user_id: String,
    pub robot_id: Option<String>,
    pub alert: Alert,
    pub resolved_symbol: Option<String>,
    pub status: SignalStatus,
    pub order_id: Option<i64>,
    pub profit: Option<Decimal>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SignalRecord {
    /// Create a new pending signal.
    pub fn pending(user_id: impl Into<String>, robot_id: Option<String>, alert: Alert) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            robot_id,
            alert,
            resolved_symbol: None,
            status: SignalStatus::Pending,
            order_id: None,
            profit: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a terminal outcome.
    pub fn finish(&mut self, outcome: &ExecutionOutcome) {
        self.status = if outcome.success {
            SignalStatus::Executed
        } else {
            SignalStatus::Failed
        };
        self.order_id = outcome.order_id;
        self.profit = outcome.profit;
        self.message = Some(outcome.message.clone());
        self.updated_at = Utc::now();
    }
}

/// Append-only record of a raw inbound alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub payload: Value,
    pub signal_id: Option<Uuid>,
    pub outcome: Option<ExecutionOutcome>,
}

impl AuditEntry {
    pub fn new(payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            payload,
            signal_id: None,
            outcome: None,
        }
    }
}
