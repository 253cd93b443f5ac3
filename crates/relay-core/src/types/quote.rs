//! Reference quotes.

use serde::{Deserialize, Serialize};

/// A live bid/ask snapshot. Used for diagnostics only, never for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    /// Get the mid price.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Get the spread.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}
