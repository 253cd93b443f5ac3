//! JSON seed file for robots and accounts.

use relay_core::error::StoreError;
use relay_core::types::{BrokerAccount, Robot};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Robots and broker accounts registered ahead of time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub robots: Vec<Robot>,
    #[serde(default)]
    pub accounts: Vec<BrokerAccount>,
}

impl SeedData {
    /// Load seed data from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        serde_json::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))
    }
}
