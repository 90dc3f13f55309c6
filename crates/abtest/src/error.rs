//! Error types for the ranking engine

use thiserror::Error;

/// Errors surfaced by the testing engine and its persistence layer.
#[derive(Debug, Error)]
pub enum AbTestError {
    /// `add_element` was called with a name that is already registered
    #[error("element already exists: {0}")]
    DuplicateElement(String),

    /// A match referenced a name that is not registered
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// A match where both sides are the same element
    #[error("invalid match: {0} cannot play itself")]
    InvalidMatch(String),

    /// A persisted record has the wrong shape or is missing required fields
    #[error("incompatible state: {0}")]
    IncompatibleState(String),

    /// A persisted sigma could not be applied because the backend treats it as read-only.
    ///
    /// Advisory only: loading continues and the warning is reported alongside the result.
    #[error("backend mismatch: {0}")]
    BackendMismatch(String),

    /// The outcome resolver named a winner that was not part of the pair
    #[error("resolver returned {winner:?} for pair ({a}, {b})")]
    InvalidOutcome { winner: String, a: String, b: String },

    /// The outcome resolver itself failed
    #[error("outcome resolver failed: {0}")]
    Resolver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// State could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be encoded
    #[error("configuration encoding error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AbTestError>;
