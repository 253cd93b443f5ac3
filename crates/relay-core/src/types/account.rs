//! Broker accounts, credentials and trading robots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Broker account category. Affects symbol suffix conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    #[default]
    Live,
    Demo,
    Prop,
}

impl std::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountClass::Live => write!(f, "live"),
            AccountClass::Demo => write!(f, "demo"),
            AccountClass::Prop => write!(f, "prop"),
        }
    }
}

/// Everything the broker API needs to act on an account.
///
/// Passed by reference into the engine for each call and never stored by it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerCredentials {
    pub account_id: String,
    pub server_name: String,
    pub session_token: String,
    pub account_class: AccountClass,
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("account_id", &self.account_id)
            .field("server_name", &self.server_name)
            .field("session_token", &"<redacted>")
            .field("account_class", &self.account_class)
            .finish()
    }
}

/// A user's broker account as held by the account collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerAccount {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub server_name: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub account_class: AccountClass,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl BrokerAccount {
    /// Credentials for the broker API, `None` without a usable session token.
    pub fn credentials(&self) -> Option<BrokerCredentials> {
        let token = self.session_token.as_deref().map(str::trim)?;
        if token.is_empty() {
            return None;
        }
        Some(BrokerCredentials {
            account_id: self.account_id.clone(),
            server_name: self.server_name.clone(),
            session_token: token.to_string(),
            account_class: self.account_class,
        })
    }
}

/// A registered trading robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Symbol the robot trades; empty, `ALL` or `*` means every symbol
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Lot size used when the alert carries none
    #[serde(default)]
    pub max_lot_size: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Robot {
    /// Whether the robot is registered for every symbol.
    pub fn trades_all_symbols(&self) -> bool {
        match self.symbol.as_deref().map(str::trim) {
            None | Some("") | Some("*") => true,
            Some(s) => s.eq_ignore_ascii_case("ALL"),
        }
    }
}

fn default_true() -> bool {
    true
}
