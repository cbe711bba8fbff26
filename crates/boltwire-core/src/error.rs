//! Error types for the client layer.

use thiserror::Error;

use crate::listener::BoxError;

/// Errors raised by a [`SlackClient`](crate::SlackClient).
#[derive(Debug, Error)]
pub enum AppError {
    /// The client refused its configuration.
    #[error("app initialization failed: {0}")]
    Initialization(String),

    /// A listener pattern could not be compiled.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending regex source.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A single listener failed while handling an activity.
    #[error("listener failed: {0}")]
    Listener(#[source] BoxError),

    /// Several listeners failed while handling the same activity.
    #[error("{} listeners failed", .0.len())]
    MultipleListeners(Vec<BoxError>),
}

impl AppError {
    /// Creates an initialization error with the given message.
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }
}

/// Result type for client operations.
pub type AppResult<T> = Result<T, AppError>;

/// Returned when a log level name is not recognised.
#[derive(Debug, Clone, Error)]
#[error("unknown log level `{0}`, expected one of: debug, info, warn, error")]
pub struct ParseLogLevelError(pub String);
