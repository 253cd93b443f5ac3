//! Core types and traits for the signal relay.
//!
//! This crate provides the foundational building blocks including:
//! - Inbound alert types and validation
//! - Broker account, position, order and outcome types
//! - Signal and audit records
//! - Async traits for the broker API and the persistence collaborators

pub mod error;
pub mod json;
pub mod traits;
pub mod types;

pub use error::{BrokerError, RelayError, ResolveError, StoreError};
pub use traits::*;
pub use types::*;
