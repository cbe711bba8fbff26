//! Environment defaults for Slack options.
//!
//! Options left unset by the host fall back to these variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SLACK_BOT_TOKEN` | `token` |
//! | `SLACK_SIGNING_SECRET` | `signing_secret` |
//! | `SLACK_SOCKET_MODE` | `socket_mode` |
//! | `SLACK_APP_TOKEN` | `app_token` |
//!
//! A `.env` file in the working directory (or a parent) is read first.
//! Variables already set in the process win over the file. A [`SlackEnv`]
//! registered in the container takes the place of both.

use std::fmt;

use figment::Figment;
use figment::providers::Env;
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix shared by every recognised variable.
pub const ENV_PREFIX: &str = "SLACK_";

/// Recognised variables, without the prefix.
pub const ENV_KEYS: [&str; 4] = ["bot_token", "signing_secret", "socket_mode", "app_token"];

/// Slack settings read from the environment.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackEnv {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub bot_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub signing_secret: Option<String>,
    /// Truthy unless unset, empty, `0`, `false`, or `no`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub socket_mode: bool,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub app_token: Option<String>,
}

impl SlackEnv {
    /// Loads the settings from `.env` and the process environment.
    pub fn load() -> Result<Self, figment::Error> {
        dotenvy::dotenv().ok();
        Self::figment().extract()
    }

    /// The figment the settings are extracted from.
    pub fn figment() -> Figment {
        Figment::new().merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS))
    }
}

impl fmt::Debug for SlackEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackEnv")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("socket_mode", &self.socket_mode)
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Whether a flag value counts as enabled.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}

/// Keeps values such as numeric secrets as text.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|value| match value {
        Text::Text(value) => value,
        Text::Unsigned(value) => value.to_string(),
        Text::Signed(value) => value.to_string(),
        Text::Float(value) => value.to_string(),
        Text::Bool(value) => value.to_string(),
    }))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
        Flag::Text(value) => is_truthy(&value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_reads_prefixed_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("SLACK_BOT_TOKEN", "xoxb-env");
            jail.set_env("SLACK_SIGNING_SECRET", "env-secret");
            jail.set_env("SLACK_APP_TOKEN", "xapp-env");
            jail.set_env("SLACK_SOCKET_MODE", "true");
            jail.set_env("SLACK_CHANNEL", "ignored");

            let env = SlackEnv::load()?;
            assert_eq!(env.bot_token.as_deref(), Some("xoxb-env"));
            assert_eq!(env.signing_secret.as_deref(), Some("env-secret"));
            assert_eq!(env.app_token.as_deref(), Some("xapp-env"));
            assert!(env.socket_mode);
            Ok(())
        });
    }

    #[test]
    fn test_numeric_values_stay_text() {
        Jail::expect_with(|jail| {
            jail.set_env("SLACK_SIGNING_SECRET", "8123456789012345");
            jail.set_env("SLACK_BOT_TOKEN", "-42");

            let env = SlackEnv::load()?;
            assert_eq!(env.signing_secret.as_deref(), Some("8123456789012345"));
            assert_eq!(env.bot_token.as_deref(), Some("-42"));
            Ok(())
        });
    }

    #[test]
    fn test_load_reads_dotenv_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                ".env",
                "SLACK_BOT_TOKEN=xoxb-dotenv\nSLACK_SIGNING_SECRET=dotenv-secret\n",
            )?;
            jail.set_env("SLACK_SIGNING_SECRET", "process-secret");

            let env = SlackEnv::load()?;
            assert_eq!(env.bot_token.as_deref(), Some("xoxb-dotenv"));
            assert_eq!(env.signing_secret.as_deref(), Some("process-secret"));
            Ok(())
        });
    }

    #[test]
    fn test_unset_environment_is_empty() {
        Jail::expect_with(|_jail| {
            assert_eq!(SlackEnv::load()?, SlackEnv::default());
            Ok(())
        });
    }

    #[test]
    fn test_socket_mode_flag_values() {
        for (raw, expected) in [("1", true), ("yes", true), ("0", false), ("false", false), ("no", false)] {
            Jail::expect_with(|jail| {
                jail.set_env("SLACK_SOCKET_MODE", raw);
                assert_eq!(SlackEnv::load()?.socket_mode, expected, "SLACK_SOCKET_MODE={raw}");
                Ok(())
            });
        }
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("on"));
        assert!(is_truthy(" TRUE "));
        assert!(!is_truthy(""));
        assert!(!is_truthy("False"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let env = SlackEnv {
            bot_token: Some("xoxb-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{env:?}").contains("xoxb-secret"));
    }
}
