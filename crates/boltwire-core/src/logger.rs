//! Logging capability required by a Slack client.

use crate::options::LogLevel;

/// Leveled logger a client writes its own diagnostics through.
///
/// The module supplies an implementation that forwards to `tracing`; hosts may
/// substitute their own through [`SlackOptions::logger`].
///
/// [`SlackOptions::logger`]: crate::SlackOptions::logger
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str);

    fn info(&self, msg: &str);

    fn warn(&self, msg: &str);

    fn error(&self, msg: &str);

    /// Records the level requested by the client.
    fn set_level(&self, level: LogLevel);

    fn level(&self) -> LogLevel;

    /// Sets the component name attached to every line.
    fn set_name(&self, name: &str);

    fn name(&self) -> String;
}
