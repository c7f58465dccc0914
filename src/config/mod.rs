//! Configuration module for the sentinel bot.
//!
//! Handles loading and validation of the Telegram transport configuration
//! and the monitoring settings from the environment.

mod settings;

pub use settings::{ConfigError, MonitorSettings, TelegramConfig};

/// Default seconds slept between successful poll cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default seconds slept after a failed poll cycle before retrying.
pub const DEFAULT_BACKOFF_INTERVAL_SECS: u64 = 60;
