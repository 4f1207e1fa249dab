//! Error types for the statistics engine.

use crate::analyzers::EventKind;
use thiserror::Error;

/// Result type for engine operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors raised by counter stores, the analyzer pool and the traversal driver.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A subcategory outside the store's allow-list was read or written.
    #[error("`{subcategory}` is not a valid subcategory for {owner}")]
    InvalidSubcategory { subcategory: String, owner: String },

    /// A counter delta could not be coerced, was negative, or overflowed.
    #[error("invalid delta {delta}: {reason}")]
    InvalidDelta { delta: String, reason: &'static str },

    /// Something that cannot act as an analyzer was offered for registration.
    #[error("cannot register analyzer: {0}")]
    RegistrationType(String),

    /// An event was fired that none of the registered analyzers handles.
    #[error("attempted to fire an event that exists for none of the registered analyzers: could `{0}` be a typo?")]
    UnknownEvent(EventKind),

    /// Course lookup returned no match.
    #[error("cannot find course with name '{name}' and term '{term}'")]
    CourseNotFound { name: String, term: String },

    /// A required configuration value is absent.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// The data retrieval collaborator failed.
    #[error("data source error: {0}")]
    Source(String),

    /// An analyzer's event handler failed.
    #[error("analyzer failed: {0}")]
    Handler(String),
}

impl StatsError {
    /// Creates an invalid delta error for the given value.
    pub fn invalid_delta(delta: impl ToString, reason: &'static str) -> Self {
        Self::InvalidDelta {
            delta: delta.to_string(),
            reason,
        }
    }

    /// Creates a data source error with the given message.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Creates a handler error with the given message.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}
