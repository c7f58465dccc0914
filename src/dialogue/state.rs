//! Dialogue state, keyed by chat.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::account::AccountHandle;

/// Stage of the credential-collection dialogue for one chat.
///
/// The secret never appears here: it flows from the inbound message
/// directly into the authentication attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    /// No dialogue in progress.
    #[default]
    Idle,

    /// Waiting for the account identifier.
    AwaitingIdentifier,

    /// Waiting for the secret; the identifier is held until the attempt.
    AwaitingSecret { identifier: String },
}

/// Per-chat session data.
#[derive(Debug, Default)]
pub struct Session {
    /// Current dialogue stage.
    pub login: LoginState,

    /// Authenticated account handle, once login succeeded.
    pub handle: Option<Arc<AccountHandle>>,
}

/// Registry of sessions keyed by chat id.
///
/// Every transition method checks and mutates under one write lock, so
/// concurrent messages from the same chat cannot interleave a stage.
#[derive(Debug, Default)]
pub struct SessionMap {
    inner: RwLock<HashMap<i64, Session>>,
}

impl SessionMap {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current dialogue stage for a chat.
    pub async fn login_state(&self, chat_id: i64) -> LoginState {
        self.inner
            .read()
            .await
            .get(&chat_id)
            .map(|session| session.login.clone())
            .unwrap_or_default()
    }

    /// Starts a dialogue. Fails when one is already in progress.
    pub async fn try_begin(&self, chat_id: i64) -> bool {
        let mut sessions = self.inner.write().await;
        let session = sessions.entry(chat_id).or_default();
        if session.login != LoginState::Idle {
            return false;
        }
        session.login = LoginState::AwaitingIdentifier;
        true
    }

    /// Stores the identifier and advances to the secret stage.
    ///
    /// Only succeeds from [`LoginState::AwaitingIdentifier`].
    pub async fn advance_to_secret(&self, chat_id: i64, identifier: String) -> bool {
        let mut sessions = self.inner.write().await;
        let session = sessions.entry(chat_id).or_default();
        if session.login != LoginState::AwaitingIdentifier {
            return false;
        }
        session.login = LoginState::AwaitingSecret { identifier };
        true
    }

    /// Takes the pending identifier, resetting the dialogue to idle.
    ///
    /// Only succeeds from [`LoginState::AwaitingSecret`]. The dialogue is
    /// back at idle before the caller awaits the authentication attempt.
    pub async fn take_pending(&self, chat_id: i64) -> Option<String> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&chat_id)?;
        match std::mem::take(&mut session.login) {
            LoginState::AwaitingSecret { identifier } => Some(identifier),
            other => {
                session.login = other;
                None
            }
        }
    }

    /// Aborts an in-progress dialogue, discarding partial data.
    ///
    /// Returns `false` when the dialogue was already idle.
    pub async fn cancel(&self, chat_id: i64) -> bool {
        let mut sessions = self.inner.write().await;
        let Some(session) = sessions.get_mut(&chat_id) else {
            return false;
        };
        if session.login == LoginState::Idle {
            return false;
        }
        session.login = LoginState::Idle;
        true
    }

    /// Stores the handle produced by a successful authentication.
    pub async fn set_handle(&self, chat_id: i64, handle: AccountHandle) {
        let mut sessions = self.inner.write().await;
        sessions.entry(chat_id).or_default().handle = Some(Arc::new(handle));
    }

    /// The chat's authenticated handle, if any.
    pub async fn handle(&self, chat_id: i64) -> Option<Arc<AccountHandle>> {
        self.inner
            .read()
            .await
            .get(&chat_id)
            .and_then(|session| session.handle.clone())
    }

    /// Whether the chat has completed a login.
    pub async fn is_authenticated(&self, chat_id: i64) -> bool {
        self.handle(chat_id).await.is_some()
    }
}
