//! `tracing`-backed implementation of the client [`Logger`] capability.

use boltwire_core::{LogLevel, Logger};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

/// Name the module gives its proxy before the client is built.
pub const SLACK_LOGGER_NAME: &str = "Slack";

/// Forwards client log calls to `tracing`, tagged with a `context` field.
///
/// The level set by the client is only recorded; filtering is left to the
/// installed subscriber.
#[derive(Debug)]
pub struct LoggerProxy {
    name: RwLock<String>,
    level: RwLock<LogLevel>,
}

impl LoggerProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a proxy with the given context name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            level: RwLock::new(LogLevel::default()),
        }
    }
}

impl Default for LoggerProxy {
    fn default() -> Self {
        Self::named("boltwire")
    }
}

impl Logger for LoggerProxy {
    fn debug(&self, message: &str) {
        debug!(context = self.name.read().as_str(), "{message}");
    }

    fn info(&self, message: &str) {
        info!(context = self.name.read().as_str(), "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(context = self.name.read().as_str(), "{message}");
    }

    fn error(&self, message: &str) {
        error!(context = self.name.read().as_str(), "{message}");
    }

    fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    fn level(&self) -> LogLevel {
        *self.level.read()
    }

    fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    fn name(&self) -> String {
        self.name.read().clone()
    }
}
