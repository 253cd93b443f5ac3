//! Core data types for the signal relay.

mod account;
mod alert;
mod order;
mod outcome;
mod position;
mod quote;
mod signal;

pub use account::{AccountClass, BrokerAccount, BrokerCredentials, Robot};
pub use alert::{Alert, AlertAction, AlertPayload, InboundAlert};
pub use order::{BrokerReply, CloseOrder, OpenOrder, Side, DEFAULT_VOLUME};
pub use outcome::ExecutionOutcome;
pub use position::OpenPosition;
pub use quote::Quote;
pub use signal::{AuditEntry, SignalRecord, SignalStatus};
