//! Account service client.

use std::fmt;
use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the account service.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Authentication failure. The service does not distinguish bad
    /// credentials from challenge/verification requirements; the raw text
    /// is all the caller gets.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The authentication attempt did not resolve within the deadline.
    #[error("authentication timed out after {0} seconds")]
    Timeout(u64),

    /// A request against an already-authenticated session failed.
    #[error("account service request failed: {0}")]
    Service(String),
}

/// Opaque reference to an authenticated account session.
///
/// Created once on the event-loop side and shared immutably with the
/// monitor task afterwards.
#[derive(Clone)]
pub struct AccountHandle {
    user_id: i64,
    username: String,
    token: String,
}

impl AccountHandle {
    /// Creates a handle from a successful authentication response.
    #[must_use]
    pub fn new(user_id: i64, username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            token: token.into(),
        }
    }

    /// The account's numeric id.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// The account's display name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The session token used as the bearer credential on API calls.
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountHandle")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Authentication capability of the account service.
pub trait AccountClient {
    /// Exchanges an identifier/secret pair for a session handle.
    ///
    /// Fails with a single opaque [`AccountError::Auth`] kind; callers
    /// cannot tell invalid credentials from a pending challenge.
    fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<AccountHandle, AccountError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user_id: i64,
    username: String,
    token: String,
}

/// HTTP implementation of [`AccountClient`] against the account service's
/// JSON API.
#[derive(Debug, Clone)]
pub struct HttpAccountClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAccountClient {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: trim_base_url(base_url.into()),
        }
    }
}

impl AccountClient for HttpAccountClient {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<AccountHandle, AccountError> {
        let url = format!("{}/api/v1/sessions", self.base_url);
        debug!("Authenticating '{}' against {}", identifier, url);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "username": identifier,
                "password": secret,
            }))
            .send()
            .await
            .map_err(|e| AccountError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(AccountError::Auth(reason));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| AccountError::Auth(e.to_string()))?;

        info!("Authenticated as {}", session.username);
        Ok(AccountHandle::new(
            session.user_id,
            session.username,
            session.token,
        ))
    }
}

pub(super) fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}
