//! Detection capability and the notification it produces.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::account::{AccountError, AccountHandle};

/// A single outbound security alert produced by a poll cycle.
///
/// Ephemeral: produced, delivered once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Human-readable alert text.
    pub message: String,

    /// When the underlying event occurred.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification stamped with the current time.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(message, Utc::now())
    }

    /// Creates a notification with an explicit timestamp.
    #[must_use]
    pub fn at(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            timestamp,
        }
    }
}

/// Inspects an authenticated account for new security events.
///
/// The poll loop is generic over this trait, so production and test
/// implementations swap without touching its state machine.
pub trait SecurityDetector {
    /// Performs one detection step against the account session.
    fn check(
        &self,
        handle: &AccountHandle,
    ) -> impl Future<Output = Result<Vec<Notification>, AccountError>> + Send;
}
