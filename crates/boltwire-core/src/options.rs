//! Client configuration.
//!
//! [`SlackOptions`] is what a host supplies (every field optional);
//! [`AppOptions`] is the fully merged value a client is constructed from.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseLogLevelError;
use crate::logger::Logger;

// =============================================================================
// LogLevel
// =============================================================================

/// Verbosity requested from the client logger.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the equivalent `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

// =============================================================================
// SlackOptions
// =============================================================================

/// Options supplied by the host application.
///
/// Unset fields are filled from the environment when the module builds its
/// client. Keys the module does not recognise are kept in [`extra`] and
/// passed to the client unchanged.
///
/// ```rust,ignore
/// let options = SlackOptions::new()
///     .token("xoxb-…")
///     .signing_secret("…")
///     .extra("processBeforeResponse", true);
/// ```
///
/// [`extra`]: SlackOptions::extra
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackOptions {
    /// Bot token (`xoxb-…`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Signing secret used to verify HTTP requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    /// Receive events over Socket Mode instead of HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_mode: Option<bool>,

    /// App-level token (`xapp-…`), required for Socket Mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_token: Option<String>,

    /// Client log level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Replaces the module's logger proxy when set.
    #[serde(skip)]
    pub logger: Option<Arc<dyn Logger>>,

    /// Pass-through fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlackOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    pub fn socket_mode(mut self, enabled: bool) -> Self {
        self.socket_mode = Some(enabled);
        self
    }

    pub fn app_token(mut self, token: impl Into<String>) -> Self {
        self.app_token = Some(token.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Adds a pass-through field.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for SlackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackOptions")
            .field("token", &redact(&self.token))
            .field("signing_secret", &redact(&self.signing_secret))
            .field("socket_mode", &self.socket_mode)
            .field("app_token", &redact(&self.app_token))
            .field("log_level", &self.log_level)
            .field("logger", &self.logger.as_ref().map(|_| "<custom>"))
            .field("extra", &self.extra)
            .finish()
    }
}

// =============================================================================
// AppOptions
// =============================================================================

/// Fully resolved options a client is constructed from.
#[derive(Clone)]
pub struct AppOptions {
    pub token: Option<String>,
    pub signing_secret: Option<String>,
    pub socket_mode: bool,
    pub app_token: Option<String>,
    pub log_level: LogLevel,
    pub logger: Arc<dyn Logger>,
    pub extra: Map<String, Value>,
}

impl fmt::Debug for AppOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppOptions")
            .field("token", &redact(&self.token))
            .field("signing_secret", &redact(&self.signing_secret))
            .field("socket_mode", &self.socket_mode)
            .field("app_token", &redact(&self.app_token))
            .field("log_level", &self.log_level)
            .field("logger", &self.logger.name())
            .field("extra", &self.extra)
            .finish()
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_options_deserialize_keeps_unknown_fields() {
        let options: SlackOptions = serde_json::from_value(serde_json::json!({
            "token": "xoxb-1",
            "signingSecret": "s",
            "logLevel": "warn",
            "processBeforeResponse": true,
        }))
        .unwrap();

        assert_eq!(options.token.as_deref(), Some("xoxb-1"));
        assert_eq!(options.signing_secret.as_deref(), Some("s"));
        assert_eq!(options.log_level, Some(LogLevel::Warn));
        assert_eq!(options.socket_mode, None);
        assert_eq!(
            options.extra.get("processBeforeResponse"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let options = SlackOptions::new().token("xoxb-secret").signing_secret("shh");
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("xoxb-secret"));
        assert!(!rendered.contains("shh"));
    }
}
