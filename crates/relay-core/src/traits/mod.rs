//! Core traits for the signal relay.

mod broker;
mod store;

pub use broker::BrokerApi;
pub use store::{AccountDirectory, AuditLog, Persistence, RobotDirectory, SignalStore};
