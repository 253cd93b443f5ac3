//! Broker integrations.

mod http;
mod paper;
pub mod parse;

pub use http::{HttpBroker, HttpBrokerConfig};
pub use paper::PaperBroker;
pub use parse::ParsedUniverse;
