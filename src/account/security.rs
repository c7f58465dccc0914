//! HTTP-backed security event detection.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::client::{AccountError, AccountHandle, trim_base_url};
use crate::monitor::{Notification, SecurityDetector};

#[derive(Debug, Deserialize)]
struct SecurityEvent {
    message: String,
    occurred_at: Option<DateTime<Utc>>,
}

/// Queries the account service's security-event feed.
///
/// Events the service has not reported before are returned as
/// notifications; the service tracks the read cursor per session token.
#[derive(Debug, Clone)]
pub struct HttpSecurityDetector {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSecurityDetector {
    /// Creates a detector for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: trim_base_url(base_url.into()),
        }
    }
}

impl SecurityDetector for HttpSecurityDetector {
    async fn check(&self, handle: &AccountHandle) -> Result<Vec<Notification>, AccountError> {
        let url = format!("{}/api/v1/security/events", self.base_url);
        debug!("Checking security events for user {}", handle.user_id());

        let response = self
            .http
            .get(&url)
            .bearer_auth(handle.bearer_token())
            .send()
            .await
            .map_err(|e| AccountError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Service(status.to_string()));
        }

        let events: Vec<SecurityEvent> = response
            .json()
            .await
            .map_err(|e| AccountError::Service(e.to_string()))?;

        Ok(events
            .into_iter()
            .map(|event| match event.occurred_at {
                Some(timestamp) => Notification::at(event.message, timestamp),
                None => Notification::new(event.message),
            })
            .collect())
    }
}
