//! In-memory store.

use async_trait::async_trait;
use chrono::Utc;
use relay_core::error::StoreError;
use relay_core::traits::{AccountDirectory, AuditLog, RobotDirectory, SignalStore};
use relay_core::types::{AuditEntry, BrokerAccount, ExecutionOutcome, Robot, SignalRecord};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::seed::SeedData;

/// Signals and audit entries kept by default.
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Default)]
struct Tables {
    robots: Vec<Robot>,
    accounts: Vec<BrokerAccount>,
    signals: HashMap<Uuid, SignalRecord>,
    /// Signal IDs in insertion order
    signal_order: VecDeque<Uuid>,
    audit: VecDeque<AuditEntry>,
}

impl Tables {
    /// Drop the oldest finished signal, or the oldest one if none finished.
    fn evict_signal(&mut self) {
        let index = self
            .signal_order
            .iter()
            .position(|id| self.signals.get(id).is_some_and(|s| s.status.is_terminal()))
            .unwrap_or(0);
        if let Some(id) = self.signal_order.remove(index) {
            self.signals.remove(&id);
            debug!("Evicted signal {}", id);
        }
    }
}

/// Keeps robots, accounts, signals and the audit log in memory.
///
/// Signals and audit entries are capped at `retention` each; past the cap
/// the oldest are dropped, finished signals before pending ones. Nothing
/// survives a restart.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    retention: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            retention: DEFAULT_RETENTION,
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retention` signals and audit entries (at least one).
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// Create a store holding the seeded robots and accounts.
    pub fn from_seed(seed: SeedData) -> Self {
        info!(
            "Seeding store with {} robots and {} accounts",
            seed.robots.len(),
            seed.accounts.len()
        );
        let tables = Tables {
            robots: seed.robots,
            accounts: seed.accounts,
            ..Default::default()
        };
        Self {
            tables: Mutex::new(tables),
            retention: DEFAULT_RETENTION,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Register a robot.
    pub fn add_robot(&self, robot: Robot) -> Result<(), StoreError> {
        self.tables()?.robots.push(robot);
        Ok(())
    }

    /// Register a broker account.
    pub fn add_account(&self, account: BrokerAccount) -> Result<(), StoreError> {
        self.tables()?.accounts.push(account);
        Ok(())
    }

    /// Retained audit entries in arrival order.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.tables()
            .map(|t| t.audit.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All signals, oldest first.
    pub fn signals(&self) -> Vec<SignalRecord> {
        let mut signals: Vec<SignalRecord> = self
            .tables()
            .map(|t| t.signals.values().cloned().collect())
            .unwrap_or_default();
        signals.sort_by_key(|s| s.created_at);
        signals
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn record_alert(&self, entry: AuditEntry) -> Result<Uuid, StoreError> {
        let id = entry.id;
        let mut tables = self.tables()?;
        tables.audit.push_back(entry);
        while tables.audit.len() > self.retention {
            tables.audit.pop_front();
        }
        debug!("Recorded alert {}", id);
        Ok(id)
    }

    async fn complete_alert(
        &self,
        audit_id: Uuid,
        signal_id: Option<Uuid>,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let entry = tables
            .audit
            .iter_mut()
            .find(|e| e.id == audit_id)
            .ok_or_else(|| StoreError::NotFound(format!("audit entry {audit_id}")))?;
        entry.signal_id = signal_id;
        entry.outcome = Some(outcome.clone());
        Ok(())
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn insert_signal(&self, record: SignalRecord) -> Result<Uuid, StoreError> {
        let id = record.id;
        let mut tables = self.tables()?;
        tables.signals.insert(id, record);
        tables.signal_order.push_back(id);
        while tables.signals.len() > self.retention {
            tables.evict_signal();
        }
        debug!("Inserted signal {}", id);
        Ok(id)
    }

    async fn finish_signal(
        &self,
        signal_id: Uuid,
        resolved_symbol: Option<String>,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let record = tables
            .signals
            .get_mut(&signal_id)
            .ok_or_else(|| StoreError::NotFound(format!("signal {signal_id}")))?;
        if resolved_symbol.is_some() {
            record.resolved_symbol = resolved_symbol;
        }
        record.finish(outcome);
        debug!("Signal {} -> {:?}", signal_id, record.status);
        Ok(())
    }

    async fn signal(&self, signal_id: Uuid) -> Result<Option<SignalRecord>, StoreError> {
        Ok(self.tables()?.signals.get(&signal_id).cloned())
    }
}

#[async_trait]
impl RobotDirectory for MemoryStore {
    async fn robot(&self, robot_id: &str) -> Result<Option<Robot>, StoreError> {
        Ok(self.tables()?.robots.iter().find(|r| r.id == robot_id).cloned())
    }

    async fn robots_for_user(&self, user_id: &str) -> Result<Vec<Robot>, StoreError> {
        Ok(self
            .tables()?
            .robots
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn active_account(&self, user_id: &str) -> Result<Option<BrokerAccount>, StoreError> {
        Ok(self
            .tables()?
            .accounts
            .iter()
            .find(|a| a.user_id == user_id && a.active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::{Alert, AlertAction, SignalStatus};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_signal_lifecycle() {
        let store = MemoryStore::new();
        let record = SignalRecord::pending("u1", None, Alert::new("EURUSD", AlertAction::OpenBuy));
        let id = store.insert_signal(record).await.unwrap();

        let outcome = ExecutionOutcome::success("ok").with_order_id(9).with_profit(dec!(0));
        store
            .finish_signal(id, Some("EURUSD.raw".into()), &outcome)
            .await
            .unwrap();

        let signal = store.signal(id).await.unwrap().unwrap();
        assert_eq!(signal.status, SignalStatus::Executed);
        assert_eq!(signal.resolved_symbol.as_deref(), Some("EURUSD.raw"));
        assert!(signal.updated_at >= signal.created_at);
        assert_eq!(store.signals().len(), 1);

        assert!(store
            .finish_signal(Uuid::new_v4(), None, &outcome)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_audit_entries_are_append_only() {
        let store = MemoryStore::new();
        let first = store
            .record_alert(AuditEntry::new(serde_json::json!({"symbol": "A"})))
            .await
            .unwrap();
        store
            .record_alert(AuditEntry::new(serde_json::json!({"symbol": "B"})))
            .await
            .unwrap();
        store
            .complete_alert(first, None, &ExecutionOutcome::failure("no robot"))
            .await
            .unwrap();

        let entries = store.audit_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload["symbol"], "A");
        assert_eq!(entries[0].outcome.as_ref().unwrap().message, "no robot");
        assert!(entries[1].outcome.is_none());
        assert!(entries[0].received_at <= Utc::now());
    }

    fn robot(id: &str) -> Robot {
        Robot {
            id: id.into(),
            user_id: "u1".into(),
            name: id.into(),
            symbol: None,
            active: true,
            max_lot_size: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_retention_evicts_finished_signals_first() {
        let store = MemoryStore::new().with_retention(2);
        let alert = || Alert::new("EURUSD", AlertAction::OpenBuy);

        let pending = store.insert_signal(SignalRecord::pending("u1", None, alert())).await.unwrap();
        let finished = store.insert_signal(SignalRecord::pending("u1", None, alert())).await.unwrap();
        store
            .finish_signal(finished, None, &ExecutionOutcome::failure("rejected"))
            .await
            .unwrap();
        let newest = store.insert_signal(SignalRecord::pending("u1", None, alert())).await.unwrap();

        assert!(store.signal(pending).await.unwrap().is_some());
        assert!(store.signal(finished).await.unwrap().is_none());
        assert!(store.signal(newest).await.unwrap().is_some());
        assert_eq!(store.signals().len(), 2);

        for symbol in ["A", "B", "C"] {
            store
                .record_alert(AuditEntry::new(serde_json::json!({ "symbol": symbol })))
                .await
                .unwrap();
        }
        let entries = store.audit_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload["symbol"], "B");
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _tables = holder.tables.lock().unwrap();
            panic!("writer crashed");
        })
        .join();

        assert!(matches!(store.add_robot(robot("r1")), Err(StoreError::Poisoned)));
        assert!(matches!(
            store.add_account(BrokerAccount {
                id: "a1".into(),
                user_id: "u1".into(),
                account_id: "1".into(),
                server_name: "S".into(),
                session_token: None,
                account_class: Default::default(),
                active: true,
            }),
            Err(StoreError::Poisoned)
        ));
    }

    #[tokio::test]
    async fn test_active_account_and_robots_by_user() {
        let seed = SeedData::from_json(
            r#"{
                "robots": [
                    {"id": "r1", "user_id": "u1", "name": "Gold", "symbol": "XAUUSD",
                     "max_lot_size": "0.2", "created_at": "2026-01-05T10:00:00Z"},
                    {"id": "r2", "user_id": "u2", "name": "Any", "created_at": "2026-01-06T10:00:00Z"}
                ],
                "accounts": [
                    {"id": "a0", "user_id": "u1", "account_id": "1", "server_name": "S", "active": false},
                    {"id": "a1", "user_id": "u1", "account_id": "2", "server_name": "S",
                     "session_token": "tok", "account_class": "prop"}
                ]
            }"#,
        )
        .unwrap();
        let store = MemoryStore::from_seed(seed);

        let robots = store.robots_for_user("u1").await.unwrap();
        assert_eq!(robots.len(), 1);
        assert_eq!(robots[0].max_lot_size, Some(dec!(0.2)));
        assert!(store.robot("r2").await.unwrap().unwrap().trades_all_symbols());

        let account = store.active_account("u1").await.unwrap().unwrap();
        assert_eq!(account.id, "a1");
        assert!(store.active_account("u3").await.unwrap().is_none());
    }
}
