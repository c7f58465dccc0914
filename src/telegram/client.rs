//! Telegram client wrapper for the bot front end.

use std::sync::Arc;

use grammers_client::{Client, InvocationError, SenderPool, sender};
use grammers_client::update::Update;
use grammers_session::storages::SqliteSession;
use grammers_session::{PackedChat, PackedType};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::RateLimiter;
use crate::config::TelegramConfig;

pub use grammers_client::sender::RawUpdatesReceiver;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Not authorized. Bot sign-in required.")]
    NotAuthorized,

    #[error("Bot sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["FLOOD_WAIT_", "flood wait "];

    for pattern in patterns {
        if let Some(idx) = err_msg.to_lowercase().find(&pattern.to_lowercase()) {
            let start = idx + pattern.len();
            let num_str: String = err_msg[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// High-level Telegram client wrapper.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Rate limiter for out-of-band alert sends.
    rate_limiter: RateLimiter,

    /// Inbound update stream.
    updates: Mutex<RawUpdatesReceiver>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if connection fails.
    pub async fn connect(
        config: &TelegramConfig,
        alert_min_interval_secs: u64,
    ) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        Ok(Self {
            client,
            handle: handle.thin,
            rate_limiter: RateLimiter::from_secs(alert_min_interval_secs),
            updates: Mutex::new(updates),
            _pool_task: pool_task,
        })
    }

    /// Checks if the client is authorized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Signs in as a bot using the configured access token.
    ///
    /// # Errors
    ///
    /// Returns an error if sign in fails.
    pub async fn sign_in_bot(&self, token: &str, api_hash: &str) -> Result<(), TelegramError> {
        info!("Signing in bot {}...", mask_token(token));

        self.client
            .bot_sign_in(token, api_hash)
            .await
            .map(|_user| ())
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))?;

        info!("Bot signed in");
        Ok(())
    }

    /// Waits for the next update from Telegram.
    ///
    /// Returns `None` when the update stream has closed.
    pub async fn next_update(&self) -> Option<Update> {
        self.updates.lock().await.recv().await
    }

    /// Sends an out-of-band alert to the given chat, rate limited.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails or if flood limited.
    pub async fn send_alert(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        if !self.is_authorized().await? {
            return Err(TelegramError::NotAuthorized);
        }

        let waited = self.rate_limiter.wait_and_acquire().await;
        if !waited.is_zero() {
            debug!("Waited {:?} for alert rate limit", waited);
        }

        debug!(
            "Sending alert to {}: \"{}\"",
            chat_id,
            truncate_for_log(text, 40)
        );

        match self.client.send_message(packed_peer(chat_id), text).await {
            Ok(_message) => Ok(()),
            Err(e) => {
                let err: TelegramError = e.into();
                if let TelegramError::FloodWait(seconds) = &err {
                    warn!("Flood wait triggered: {} seconds", seconds);
                    self.rate_limiter.handle_flood_wait(*seconds).await;
                }
                Err(err)
            }
        }
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Builds a packed peer from a bare chat id.
///
/// Negative ids address group chats, positive ids address users the bot
/// has already exchanged messages with (no access hash on file).
fn packed_peer(chat_id: i64) -> PackedChat {
    if chat_id < 0 {
        PackedChat {
            ty: PackedType::Chat,
            id: -chat_id,
            access_hash: None,
        }
    } else {
        PackedChat {
            ty: PackedType::User,
            id: chat_id,
            access_hash: None,
        }
    }
}

/// Masks a bot token for logging (shows only the numeric bot id).
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _secret)) if !bot_id.is_empty() => format!("{bot_id}:***"),
        _ => "***".to_owned(),
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("123456:AAbbCCdd"), "123456:***");
        assert_eq!(mask_token("no-colon-token"), "***");
        assert_eq!(mask_token(":secret-only"), "***");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello", 10), "Hello");
        assert_eq!(truncate_for_log("Hello, World!", 5), "Hello...");
    }

    #[test]
    fn test_extract_flood_wait() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(extract_flood_wait_seconds("flood wait 60 seconds"), Some(60));
        assert_eq!(extract_flood_wait_seconds("some other error"), None);
    }

    #[test]
    fn test_packed_peer_distinguishes_groups_from_users() {
        let group = packed_peer(-4200);
        assert_eq!(group.ty, PackedType::Chat);
        assert_eq!(group.id, 4200);

        let user = packed_peer(1337);
        assert_eq!(user.ty, PackedType::User);
        assert_eq!(user.id, 1337);
    }
}
