//! Module error types.

use boltwire_core::{AppError, BoxError};
use thiserror::Error;

/// Errors raised while resolving providers from the [`Container`](crate::Container).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No provider is registered for the requested type.
    #[error("no provider registered for `{type_name}`")]
    MissingProvider { type_name: &'static str },
}

/// Errors that can occur while building or bootstrapping the Slack module.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Provider resolution failed.
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Environment settings could not be extracted.
    #[error("Failed to load Slack environment: {0}")]
    Config(#[from] figment::Error),

    /// The options factory returned an error.
    #[error("Slack options factory failed: {0}")]
    OptionsFactory(#[source] BoxError),

    /// The client rejected its options or a handler registration.
    #[error("Slack client error: {0}")]
    Client(#[from] AppError),
}

/// Result type for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;
