//! Persistence collaborator traits.
//!
//! The engine only reads robots and accounts and appends signals and audit
//! entries; storage itself lives outside the engine.

use crate::error::StoreError;
use crate::types::{AuditEntry, BrokerAccount, ExecutionOutcome, Robot, SignalRecord};
use async_trait::async_trait;
use uuid::Uuid;

/// Append-only log of raw inbound alerts.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record a raw alert and return its entry ID.
    async fn record_alert(&self, entry: AuditEntry) -> Result<Uuid, StoreError>;

    /// Attach the signal and outcome to a recorded alert.
    async fn complete_alert(
        &self,
        audit_id: Uuid,
        signal_id: Option<Uuid>,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError>;
}

/// Signals table keyed by generated ID.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Insert a new signal row.
    async fn insert_signal(&self, record: SignalRecord) -> Result<Uuid, StoreError>;

    /// Move a pending signal to EXECUTED or FAILED.
    async fn finish_signal(
        &self,
        signal_id: Uuid,
        resolved_symbol: Option<String>,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError>;

    /// Look up a signal.
    async fn signal(&self, signal_id: Uuid) -> Result<Option<SignalRecord>, StoreError>;
}

/// Read-only view of registered robots.
#[async_trait]
pub trait RobotDirectory: Send + Sync {
    /// Get a robot by ID.
    async fn robot(&self, robot_id: &str) -> Result<Option<Robot>, StoreError>;

    /// Get every robot belonging to a user.
    async fn robots_for_user(&self, user_id: &str) -> Result<Vec<Robot>, StoreError>;
}

/// Read-only view of broker accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Get the user's single active broker account.
    async fn active_account(&self, user_id: &str) -> Result<Option<BrokerAccount>, StoreError>;
}

/// Everything the orchestrator needs from persistence.
pub trait Persistence: AuditLog + SignalStore + RobotDirectory + AccountDirectory {}

impl<T> Persistence for T where T: AuditLog + SignalStore + RobotDirectory + AccountDirectory {}
