//! Alert handling from receipt to outcome.

use relay_core::error::RelayError;
use relay_core::traits::{
    AccountDirectory, AuditLog, BrokerApi, Persistence, RobotDirectory, SignalStore,
};
use relay_core::types::{
    Alert, AlertAction, AlertPayload, AuditEntry, BrokerCredentials, ExecutionOutcome,
    InboundAlert, Robot, SignalRecord, SignalStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::executor::OrderExecutor;
use crate::market;
use crate::resolver::{normalize, SymbolResolver};

/// Longest order comment the broker keeps.
const MAX_COMMENT_LEN: usize = 31;

/// What the caller gets back for a well-formed alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<Uuid>,
    pub status: SignalStatus,
}

impl SignalReport {
    fn new(signal_id: Option<Uuid>, outcome: ExecutionOutcome) -> Self {
        let status = if outcome.success {
            SignalStatus::Executed
        } else {
            SignalStatus::Failed
        };
        Self {
            outcome,
            signal_id,
            status,
        }
    }
}

/// Pick the robot for an alert symbol among a user's robots.
///
/// Only active robots count. Robots registered for the symbol beat
/// all-symbol robots; among equals the most recently created wins.
pub fn select_robot<'a>(robots: &'a [Robot], symbol: &str) -> Option<&'a Robot> {
    let wanted = normalize(symbol);
    robots
        .iter()
        .filter(|r| r.active)
        .filter_map(|r| {
            if r.trades_all_symbols() {
                Some((1u8, r))
            } else {
                r.symbol
                    .as_deref()
                    .map(|s| normalize(s.trim()))
                    .filter(|s| s.eq_ignore_ascii_case(wanted))
                    .map(|_| (0u8, r))
            }
        })
        .min_by(|(rank_a, a), (rank_b, b)| {
            rank_a
                .cmp(rank_b)
                .then_with(|| b.created_at.cmp(&a.created_at))
        })
        .map(|(_, r)| r)
}

/// Ties symbol resolution, position lookup and execution together.
///
/// Each alert is handled end to end with sequential broker calls; nothing
/// is shared between alerts except the collaborators themselves.
#[derive(Clone)]
pub struct SignalOrchestrator {
    broker: Arc<dyn BrokerApi>,
    store: Arc<dyn Persistence>,
    resolver: SymbolResolver,
    executor: OrderExecutor,
}

impl SignalOrchestrator {
    pub fn new(broker: Arc<dyn BrokerApi>, store: Arc<dyn Persistence>) -> Self {
        Self {
            executor: OrderExecutor::new(broker.clone()),
            resolver: SymbolResolver::new(),
            broker,
            store,
        }
    }

    /// Handle one raw webhook body.
    ///
    /// Returns `Err` only for malformed input, before any side effect.
    /// Every business failure comes back as a report.
    pub async fn handle(&self, raw: Value) -> Result<SignalReport, RelayError> {
        let payload: AlertPayload = serde_json::from_value(raw.clone())
            .map_err(|e| RelayError::ClientInput(e.to_string()))?;
        let inbound = payload.validate()?;
        info!(
            "Alert from {}: {} {}",
            inbound.user_id, inbound.alert.action, inbound.alert.symbol
        );

        let audit_id = match self.store.record_alert(AuditEntry::new(raw)).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Failed to record alert: {}", e);
                None
            }
        };

        let report = self.process(&inbound).await;
        info!(
            "Alert {} {} finished {:?}: {}",
            inbound.alert.action, inbound.alert.symbol, report.status, report.outcome.message
        );

        if let Some(audit_id) = audit_id {
            if let Err(e) = self
                .store
                .complete_alert(audit_id, report.signal_id, &report.outcome)
                .await
            {
                error!("Failed to update audit entry {}: {}", audit_id, e);
            }
        }

        Ok(report)
    }

    async fn process(&self, inbound: &InboundAlert) -> SignalReport {
        let robot = match self.find_robot(inbound).await {
            Ok(Some(robot)) => robot,
            Ok(None) => return self.park(inbound).await,
            Err(e) => return SignalReport::new(None, e.into()),
        };
        debug!("Alert routed to robot {} ({})", robot.name, robot.id);

        let credentials = match self.credentials(&inbound.user_id).await {
            Ok(credentials) => credentials,
            Err(e) => return SignalReport::new(None, e.into()),
        };

        let alert = merge_volume(&inbound.alert, &robot);
        let record = SignalRecord::pending(&inbound.user_id, Some(robot.id.clone()), alert.clone());
        let signal_id = match self.store.insert_signal(record).await {
            Ok(id) => id,
            Err(e) => return SignalReport::new(None, RelayError::from(e).into()),
        };

        let (resolved, outcome) = self.execute(&alert, &robot, &credentials).await;

        if let Err(e) = self
            .store
            .finish_signal(signal_id, resolved, &outcome)
            .await
        {
            error!("Failed to update signal {}: {}", signal_id, e);
        }
        SignalReport::new(Some(signal_id), outcome)
    }

    /// No robot: keep the signal as PENDING and report a business failure.
    async fn park(&self, inbound: &InboundAlert) -> SignalReport {
        let message = format!(
            "No active robot for {} on {}",
            inbound.user_id, inbound.alert.symbol
        );
        info!("{}", message);

        let record = SignalRecord::pending(&inbound.user_id, None, inbound.alert.clone());
        let signal_id = match self.store.insert_signal(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Failed to record pending signal: {}", e);
                None
            }
        };

        SignalReport {
            outcome: ExecutionOutcome::failure(message),
            signal_id,
            status: SignalStatus::Pending,
        }
    }

    async fn find_robot(&self, inbound: &InboundAlert) -> Result<Option<Robot>, RelayError> {
        if let Some(bot_id) = &inbound.bot_id {
            match self.store.robot(bot_id).await? {
                Some(robot) if robot.active && robot.user_id == inbound.user_id => {
                    return Ok(Some(robot));
                }
                _ => debug!("Robot {} not usable for {}, searching by symbol", bot_id, inbound.user_id),
            }
        }

        let robots = self.store.robots_for_user(&inbound.user_id).await?;
        Ok(select_robot(&robots, &inbound.alert.symbol).cloned())
    }

    async fn credentials(&self, user_id: &str) -> Result<BrokerCredentials, RelayError> {
        let account = self
            .store
            .active_account(user_id)
            .await?
            .ok_or_else(|| RelayError::Precondition(format!("no active broker account for {user_id}")))?;

        account.credentials().ok_or_else(|| {
            RelayError::Precondition(format!("broker account {} has no session token", account.id))
        })
    }

    /// Resolve the alert symbol, falling back to a guess only when the
    /// symbol listing cannot be fetched.
    pub async fn resolve_symbol(
        &self,
        raw: &str,
        credentials: &BrokerCredentials,
    ) -> Result<String, RelayError> {
        let universe = match self.broker.symbols(credentials).await {
            Ok(universe) => Some(universe),
            Err(e) => {
                warn!("Symbol list unavailable for {}: {}", credentials.account_id, e);
                None
            }
        };

        let resolved = self
            .resolver
            .resolve(raw, credentials.account_class, universe.as_deref())?;
        info!("Resolved {} -> {}", raw, resolved);
        Ok(resolved)
    }

    async fn execute(
        &self,
        alert: &Alert,
        robot: &Robot,
        credentials: &BrokerCredentials,
    ) -> (Option<String>, ExecutionOutcome) {
        if let (AlertAction::Close, Some(ticket)) = (alert.action, alert.target_ticket) {
            return (None, self.executor.close_by_ticket(ticket, credentials).await);
        }

        let symbol = match self.resolve_symbol(&alert.symbol, credentials).await {
            Ok(symbol) => symbol,
            Err(e) => return (None, e.into()),
        };

        let outcome = match alert.action.open_side() {
            Some(side) => {
                market::get_quote(self.broker.as_ref(), &symbol, credentials).await;
                market::subscribe(self.broker.as_ref(), &symbol, credentials).await;

                let comment = alert
                    .strategy_tag
                    .clone()
                    .unwrap_or_else(|| robot.name.clone())
                    .chars()
                    .take(MAX_COMMENT_LEN)
                    .collect::<String>();
                self.executor
                    .open(
                        &symbol,
                        side,
                        alert.volume,
                        alert.stop_loss,
                        alert.take_profit,
                        Some(comment).filter(|c| !c.is_empty()),
                        credentials,
                    )
                    .await
            }
            None => self.executor.close_all(&symbol, credentials).await,
        };

        (Some(symbol), outcome)
    }
}

/// Alert volume, else the robot's max lot size when positive.
fn merge_volume(alert: &Alert, robot: &Robot) -> Alert {
    let mut alert = alert.clone();
    if alert.volume.is_none() {
        alert.volume = robot.max_lot_size.filter(|v| *v > Decimal::ZERO);
    }
    alert
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use relay_broker::PaperBroker;
    use relay_core::types::{AccountClass, BrokerAccount, BrokerReply, OpenPosition, Side};
    use relay_store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn robot(id: &str, symbol: Option<&str>, age_mins: i64) -> Robot {
        Robot {
            id: id.into(),
            user_id: "u1".into(),
            name: format!("robot {id}"),
            symbol: symbol.map(str::to_string),
            active: true,
            max_lot_size: None,
            created_at: Utc::now() - Duration::minutes(age_mins),
        }
    }

    fn account(class: AccountClass, token: Option<&str>) -> BrokerAccount {
        BrokerAccount {
            id: "acc-1".into(),
            user_id: "u1".into(),
            account_id: "5001".into(),
            server_name: "Broker-Server".into(),
            session_token: token.map(str::to_string),
            account_class: class,
            active: true,
        }
    }

    fn setup(broker: &PaperBroker, robots: Vec<Robot>, account: Option<BrokerAccount>) -> (SignalOrchestrator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for r in robots {
            store.add_robot(r).unwrap();
        }
        if let Some(a) = account {
            store.add_account(a).unwrap();
        }
        let orchestrator = SignalOrchestrator::new(Arc::new(broker.clone()), store.clone());
        (orchestrator, store)
    }

    #[test]
    fn test_select_robot_prefers_symbol_then_newest() {
        let robots = vec![
            robot("all-new", None, 1),
            robot("gold-old", Some("XAUUSD"), 60),
            robot("gold-new", Some("xauusd.raw"), 5),
            robot("euro", Some("EURUSD"), 0),
        ];
        assert_eq!(select_robot(&robots, "XAUUSD").unwrap().id, "gold-new");
        assert_eq!(select_robot(&robots, "GBPUSD").unwrap().id, "all-new");

        let mut inactive = robots.clone();
        inactive[2].active = false;
        assert_eq!(select_robot(&inactive, "XAUUSD").unwrap().id, "gold-old");

        assert!(select_robot(&robots[1..2], "EURUSD").is_none());
    }

    #[tokio::test]
    async fn test_open_buy_end_to_end() {
        let broker = PaperBroker::new(["EURUSD", "GOLD.raw"])
            .with_send_reply(Ok(BrokerReply::ok("123456")));
        let mut gold = robot("gold", Some("XAUUSD"), 0);
        gold.max_lot_size = Some(dec!(0.25));
        let (orchestrator, store) = setup(&broker, vec![gold], Some(account(AccountClass::Live, Some("tok"))));

        let report = orchestrator
            .handle(json!({"symbol": "XAUUSD", "action": "OPEN_BUY", "userId": "u1", "price": 1999.0}))
            .await
            .unwrap();

        assert!(report.outcome.success);
        assert_eq!(report.outcome.order_id, Some(123456));
        assert_eq!(report.outcome.profit, Some(Decimal::ZERO));
        assert_eq!(report.status, SignalStatus::Executed);
        assert!(broker
            .calls()
            .contains(&"order_send GOLD.raw Buy 0.25".to_string()));

        let signal = store.signal(report.signal_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(signal.status, SignalStatus::Executed);
        assert_eq!(signal.resolved_symbol.as_deref(), Some("GOLD.raw"));
        assert_eq!(signal.robot_id.as_deref(), Some("gold"));

        let audit = store.audit_entries();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].signal_id, report.signal_id);
        assert!(audit[0].outcome.as_ref().unwrap().success);
    }

    #[tokio::test]
    async fn test_malformed_alert_makes_no_calls() {
        let broker = PaperBroker::new(["EURUSD"]);
        let (orchestrator, store) = setup(&broker, vec![robot("r", None, 0)], Some(account(AccountClass::Live, Some("tok"))));

        for body in [
            json!({"symbol": "EURUSD", "userId": "u1"}),
            json!({"symbol": "EURUSD", "action": "HOLD", "userId": "u1"}),
            json!({"symbol": 12, "action": "BUY", "userId": "u1"}),
            json!({"symbol": "OANDA:", "action": "BUY", "userId": "u1"}),
        ] {
            let err = orchestrator.handle(body).await.unwrap_err();
            assert!(err.is_client_error());
        }

        assert!(broker.calls().is_empty());
        assert!(store.audit_entries().is_empty());
    }

    #[tokio::test]
    async fn test_no_robot_parks_pending_signal() {
        let broker = PaperBroker::new(["EURUSD"]);
        let (orchestrator, store) = setup(&broker, vec![robot("gold", Some("XAUUSD"), 0)], Some(account(AccountClass::Live, Some("tok"))));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u1"}))
            .await
            .unwrap();

        assert!(!report.outcome.success);
        assert!(report.outcome.message.contains("No active robot"));
        assert_eq!(report.status, SignalStatus::Pending);
        let signal = store.signal(report.signal_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(signal.status, SignalStatus::Pending);
        assert!(broker.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_precondition_failure() {
        let broker = PaperBroker::new(["EURUSD"]);
        let (orchestrator, _store) = setup(&broker, vec![robot("r", None, 0)], Some(account(AccountClass::Live, None)));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u1"}))
            .await
            .unwrap();
        assert!(!report.outcome.success);
        assert!(report.outcome.message.contains("session token"));
        assert!(broker.calls().is_empty());

        let (orchestrator, _store) = setup(&broker, vec![robot("r", None, 0)], None);
        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u1"}))
            .await
            .unwrap();
        assert!(report.outcome.message.contains("no active broker account"));
    }

    #[tokio::test]
    async fn test_bot_id_wins_over_symbol_match() {
        let broker = PaperBroker::new(["EURUSD"]);
        let (orchestrator, store) = setup(
            &broker,
            vec![robot("euro", Some("EURUSD"), 0), robot("picked", None, 90)],
            Some(account(AccountClass::Live, Some("tok"))),
        );

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "SELL", "userId": "u1", "botId": "picked"}))
            .await
            .unwrap();
        let signal = store.signal(report.signal_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(signal.robot_id.as_deref(), Some("picked"));
    }

    #[tokio::test]
    async fn test_unresolvable_symbol_fails_signal() {
        let broker = PaperBroker::new(["BTCUSD"]);
        let (orchestrator, store) = setup(&broker, vec![robot("r", None, 0)], Some(account(AccountClass::Live, Some("tok"))));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u1"}))
            .await
            .unwrap();
        assert!(!report.outcome.success);
        assert!(report.outcome.message.contains("not found"));
        let signal = store.signal(report.signal_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(signal.status, SignalStatus::Failed);
        assert!(!broker.calls().iter().any(|c| c.starts_with("order_send")));
    }

    #[tokio::test]
    async fn test_fallback_symbol_when_universe_unavailable() {
        let broker = PaperBroker::new(Vec::<String>::new())
            .with_unavailable_universe()
            .with_failing_subscribe();
        let (orchestrator, _store) = setup(&broker, vec![robot("r", None, 0)], Some(account(AccountClass::Prop, Some("tok"))));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "BUY", "userId": "u1", "volume": 0.3}))
            .await
            .unwrap();
        assert!(report.outcome.success);
        assert!(broker
            .calls()
            .contains(&"order_send EURUSD.raw Buy 0.3".to_string()));
    }

    #[tokio::test]
    async fn test_close_by_symbol_and_ticket() {
        let broker = PaperBroker::new(["EURUSD.m"])
            .with_position(OpenPosition::new(1, "EURUSD.m", Side::Buy, dec!(0.1)).with_profit(dec!(2)))
            .with_position(OpenPosition::new(2, "EURUSD.m", Side::Sell, dec!(0.1)).with_profit(dec!(3)));
        let (orchestrator, store) = setup(&broker, vec![robot("r", None, 0)], Some(account(AccountClass::Live, Some("tok"))));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "CLOSE", "userId": "u1", "ticket": 2, "volume": 9}))
            .await
            .unwrap();
        assert!(report.outcome.success);
        assert_eq!(report.outcome.profit, Some(dec!(3)));
        assert!(broker.calls().contains(&"order_close 2 0.1".to_string()));
        assert!(!broker.calls().contains(&"symbols".to_string()));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "CLOSE", "userId": "u1"}))
            .await
            .unwrap();
        assert!(report.outcome.success);
        assert!(report.outcome.message.contains("1 of 1"));
        let signal = store.signal(report.signal_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(signal.resolved_symbol.as_deref(), Some("EURUSD.m"));

        let report = orchestrator
            .handle(json!({"symbol": "EURUSD", "action": "CLOSE", "userId": "u1", "ticket": 2}))
            .await
            .unwrap();
        assert!(report.outcome.success);
        assert!(report.outcome.message.contains("already closed"));
    }

    #[tokio::test]
    async fn test_report_serializes_flat() {
        let report = SignalReport::new(
            Some(Uuid::nil()),
            ExecutionOutcome::success("ok").with_order_id(5),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["orderId"], 5);
        assert_eq!(value["signalId"], Uuid::nil().to_string());
        assert_eq!(value["status"], "EXECUTED");
    }
}
