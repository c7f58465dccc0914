//! Application settings and Telegram configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_BACKOFF_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS};

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot access token (obtain from `@BotFather`).
    pub bot_token: String,

    /// Chat that receives out-of-band security alerts.
    pub alert_chat_id: i64,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("sentinel.session.db")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, bot_token: String, alert_chat_id: i64) -> Self {
        Self {
            api_id,
            api_hash,
            bot_token,
            alert_chat_id,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID`, `TG_API_HASH`, `BOT_TOKEN` and `ALERT_CHAT_ID`
    /// to be set. Startup aborts if any of them is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let alert_chat_id: i64 = std::env::var("ALERT_CHAT_ID")
            .map_err(|_| ConfigError::MissingEnvVar("ALERT_CHAT_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidChatId)?;

        let session_path =
            std::env::var("SESSION_PATH").map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            alert_chat_id,
            session_path,
        })
    }
}

/// Monitoring and account-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Base URL of the account service API. When absent, `/login` reports
    /// that account access is unavailable.
    pub account_api_url: Option<String>,

    /// Seconds between successful poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to back off after a failed poll cycle.
    #[serde(default = "default_backoff_interval")]
    pub backoff_interval_secs: u64,

    /// Timeout for a single authentication attempt in seconds.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,

    /// Minimum interval between outgoing alert messages in seconds.
    #[serde(default = "default_alert_min_interval")]
    pub alert_min_interval_secs: u64,
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_backoff_interval() -> u64 {
    DEFAULT_BACKOFF_INTERVAL_SECS
}

const fn default_auth_timeout() -> u64 {
    15
}

const fn default_alert_min_interval() -> u64 {
    2
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            account_api_url: None,
            poll_interval_secs: default_poll_interval(),
            backoff_interval_secs: default_backoff_interval(),
            auth_timeout_secs: default_auth_timeout(),
            alert_min_interval_secs: default_alert_min_interval(),
        }
    }
}

impl MonitorSettings {
    /// Creates monitor settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            account_api_url: std::env::var("ACCOUNT_API_URL").ok(),
            poll_interval_secs: env_u64("POLL_INTERVAL_SECS", default_poll_interval()),
            backoff_interval_secs: env_u64("BACKOFF_INTERVAL_SECS", default_backoff_interval()),
            auth_timeout_secs: env_u64("AUTH_TIMEOUT_SECS", default_auth_timeout()),
            alert_min_interval_secs: env_u64("ALERT_MIN_INTERVAL_SECS", default_alert_min_interval()),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Invalid alert chat ID format (must be an integer)")]
    InvalidChatId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.poll_interval_secs, 30);
        assert_eq!(settings.backoff_interval_secs, 60);
        assert_eq!(settings.auth_timeout_secs, 15);
        assert!(settings.account_api_url.is_none());
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned(), "42:token".to_owned(), -100);
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.alert_chat_id, -100);
        assert_eq!(config.session_path, PathBuf::from("sentinel.session.db"));
    }

    #[test]
    fn test_missing_env_var_names_the_variable() {
        let err = ConfigError::MissingEnvVar("BOT_TOKEN");
        assert!(err.to_string().contains("BOT_TOKEN"));
    }
}
