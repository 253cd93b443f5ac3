//! Error types for the signal relay.

use thiserror::Error;

/// Top-level relay error, one variant per failure class an alert can hit.
///
/// Everything except [`RelayError::ClientInput`] is a business failure: the
/// orchestrator turns it into an `ExecutionOutcome` and the transport still
/// answers with success.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Malformed JSON or missing/invalid alert fields.
    #[error("Invalid alert: {0}")]
    ClientInput(String),

    /// No active robot, no broker symbol, or nothing open to close.
    #[error("{0}")]
    NoMatch(String),

    /// Broker answered with an error or with a body we cannot read.
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// Missing broker account or session token.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RelayError {
    /// Whether the error should be answered with a 4xx instead of an outcome.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::ClientInput(_))
    }
}

impl From<BrokerError> for RelayError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::ApiError { body, .. } => RelayError::BrokerUnavailable(body),
            other => RelayError::BrokerUnavailable(other.to_string()),
        }
    }
}

impl From<ResolveError> for RelayError {
    fn from(err: ResolveError) -> Self {
        RelayError::NoMatch(err.to_string())
    }
}

/// Broker API errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-2xx HTTP status; the body is kept verbatim.
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    /// The response was readable but carried nothing usable.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Symbol resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Broker symbol universe is empty")]
    EmptyUniverse,

    #[error("Symbol {0} not found in broker symbol list")]
    NotFound(String),
}

/// Persistence collaborator errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Store lock poisoned")]
    Poisoned,
}
