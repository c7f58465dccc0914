//! Login dialogue controller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::state::SessionMap;
use crate::account::{AccountClient, AccountError};
use crate::commands::CommandResult;

/// Drives the credential-collection dialogue for every chat.
///
/// All transitions are observable only through the returned reply
/// messages; there is no separate state-change event stream.
pub struct LoginController<C> {
    /// Account service client; `None` when no service is configured.
    client: Option<Arc<C>>,

    /// Shared session registry.
    sessions: Arc<SessionMap>,

    /// Deadline for a single authentication attempt.
    auth_timeout: Duration,
}

impl<C: AccountClient> LoginController<C> {
    /// Creates a new controller.
    #[must_use]
    pub fn new(client: Option<Arc<C>>, sessions: Arc<SessionMap>, auth_timeout: Duration) -> Self {
        Self {
            client,
            sessions,
            auth_timeout,
        }
    }

    /// Starts the dialogue for a chat.
    pub async fn begin(&self, chat_id: i64) -> CommandResult {
        if self.client.is_none() {
            return CommandResult::error(
                "Account login is not available: no account service is configured.",
            );
        }

        if !self.sessions.try_begin(chat_id).await {
            return CommandResult::error(
                "A login is already in progress. Send the requested value or use /cancel.",
            );
        }

        CommandResult::success("Account login\n\nEnter your account username:")
    }

    /// Feeds a free-text message into the dialogue.
    ///
    /// Returns `None` when no dialogue stage is waiting for input, so
    /// unrelated chatter produces no reply.
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Option<CommandResult> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // The secret stage is checked first: take_pending resets the
        // dialogue to idle before the attempt is awaited, so the secret
        // only ever lives inside the in-flight call.
        if let Some(identifier) = self.sessions.take_pending(chat_id).await {
            return Some(self.authenticate(chat_id, identifier, text).await);
        }

        if self.sessions.advance_to_secret(chat_id, text.to_owned()).await {
            return Some(CommandResult::success(format!(
                "Username: {text}\n\nNow enter your password:"
            )));
        }

        None
    }

    /// Aborts an in-progress dialogue.
    pub async fn cancel(&self, chat_id: i64) -> CommandResult {
        if self.sessions.cancel(chat_id).await {
            CommandResult::success("Login cancelled.")
        } else {
            CommandResult::error("No login in progress.")
        }
    }

    /// Attempts authentication with the collected pair. One attempt, no
    /// retry; any failure returns the dialogue to idle with the raw error
    /// text in the reply.
    async fn authenticate(&self, chat_id: i64, identifier: String, secret: &str) -> CommandResult {
        let Some(client) = &self.client else {
            return CommandResult::error(
                "Account login is not available: no account service is configured.",
            );
        };

        info!("Attempting account login for chat {}", chat_id);

        let attempt = client.authenticate(&identifier, secret);
        match tokio::time::timeout(self.auth_timeout, attempt).await {
            Ok(Ok(handle)) => {
                let username = handle.username().to_owned();
                self.sessions.set_handle(chat_id, handle).await;
                info!("Chat {} logged in as {}", chat_id, username);
                CommandResult::success(format!(
                    "✓ Logged in as {username}\n\nUse /monitor to start security monitoring."
                ))
            }
            Ok(Err(e)) => {
                warn!("Login failed for chat {}: {}", chat_id, e);
                CommandResult::error(format!("Login failed: {e}"))
            }
            Err(_) => {
                let e = AccountError::Timeout(self.auth_timeout.as_secs());
                warn!("Login failed for chat {}: {}", chat_id, e);
                CommandResult::error(format!("Login failed: {e}"))
            }
        }
    }
}

impl<C> std::fmt::Debug for LoginController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginController")
            .field("configured", &self.client.is_some())
            .field("auth_timeout", &self.auth_timeout)
            .finish_non_exhaustive()
    }
}
