//! Error taxonomy for the exchange core

use thiserror::Error;

/// Errors that can occur while composing or evaluating an exchange graph
///
/// Connection- and construction-time errors are caller-correctable
/// configuration mistakes; they are raised synchronously to the immediate
/// caller and never retried. The one deliberate exception is listener
/// failure during change notification, which is absorbed at the dispatch
/// site (see [`crate::event::EventBroadcast::emit`]).
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("provider({provider}) and consumer({consumer}) are not connectable: {reason}")]
    IncompatibleConnection {
        provider: String,
        consumer: String,
        reason: String,
    },

    #[error("identifier {0} does not belong to this factory")]
    UnknownAdaptorId(String),

    #[error("target of {0} is not defined or its spatial definition is not an element set")]
    InvalidTarget(String),

    #[error("invalid query from {querier} in get_values() call to adaptor {adaptor}: {reason}")]
    InvalidQuery {
        adaptor: String,
        querier: String,
        reason: String,
    },

    #[error("element count mismatch on {item}: expected {expected}, got {actual}")]
    ElementCountMismatch {
        item: String,
        expected: usize,
        actual: usize,
    },

    #[error("adaptee of {0} is gone or was never attached")]
    MissingAdaptee(String),

    #[error("{item} is missing required state: {what}")]
    MissingState { item: String, what: String },

    #[error("unsupported adaptee for {adaptor}: {reason}")]
    UnsupportedAdaptee { adaptor: String, reason: String },

    #[error("listener {0} failed during change notification")]
    Listener(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;
