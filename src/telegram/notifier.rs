//! Alert delivery task.
//!
//! The security monitor never talks to Telegram directly: it queues
//! notifications on a channel, and this task drains the channel on the
//! front end's runtime context and performs the sends. Delivery failures
//! are logged and swallowed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::TelegramBot;
use crate::monitor::Notification;

/// Drains queued notifications into Telegram alert messages.
pub struct AlertNotifier {
    /// Transport used for sends.
    bot: Arc<TelegramBot>,

    /// Destination chat for out-of-band alerts.
    alert_chat_id: i64,
}

impl AlertNotifier {
    /// Creates a notifier targeting the configured alert chat.
    #[must_use]
    pub fn new(bot: Arc<TelegramBot>, alert_chat_id: i64) -> Self {
        Self { bot, alert_chat_id }
    }

    /// Runs until the alert channel closes.
    pub async fn run(self, mut alerts: mpsc::Receiver<Notification>) {
        debug!("Alert notifier started");

        while let Some(notification) = alerts.recv().await {
            let text = format_alert(&notification);
            if let Err(e) = self.bot.send_alert(self.alert_chat_id, &text).await {
                warn!("Failed to deliver alert: {}", e);
            }
        }

        debug!("Alert channel closed, notifier exiting");
    }
}

impl std::fmt::Debug for AlertNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertNotifier")
            .field("alert_chat_id", &self.alert_chat_id)
            .finish_non_exhaustive()
    }
}

/// Formats a notification as an alert message.
fn format_alert(notification: &Notification) -> String {
    format!(
        "Security alert\n\n{}\n\n{}",
        notification.message,
        notification.timestamp.format("%H:%M:%S UTC")
    )
}
