//! Security monitor poll loop.
//!
//! Each cycle:
//! 1. Read the active flag / run token; exit if superseded or stopped
//! 2. Invoke the detection step
//! 3. On success: record the check time, queue any notifications for the
//!    front end, sleep the poll interval
//! 4. On failure: log and sleep the longer backoff interval
//!
//! Detection failures never terminate the loop, and the loop never talks
//! to the transport directly: notifications go through the alert channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::detector::{Notification, SecurityDetector};
use super::state::MonitorState;
use crate::account::AccountHandle;
use crate::config::{DEFAULT_BACKOFF_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS};

/// Periodic security check runner.
pub struct SecurityMonitor<D> {
    /// Detection capability.
    detector: Arc<D>,

    /// Authenticated account session being watched.
    handle: Arc<AccountHandle>,

    /// Shared monitoring state.
    state: Arc<MonitorState>,

    /// Channel to the front end's alert notifier.
    alerts: mpsc::Sender<Notification>,

    /// Token identifying this activation.
    run: u64,

    /// Sleep after a successful cycle.
    poll_interval: Duration,

    /// Sleep after a failed cycle.
    backoff_interval: Duration,
}

impl<D> SecurityMonitor<D>
where
    D: SecurityDetector + Send + Sync + 'static,
{
    /// Creates a monitor for one activation.
    ///
    /// `run` must be the token returned by [`MonitorState::try_activate`].
    #[must_use]
    pub fn new(
        detector: Arc<D>,
        handle: Arc<AccountHandle>,
        state: Arc<MonitorState>,
        alerts: mpsc::Sender<Notification>,
        run: u64,
    ) -> Self {
        Self {
            detector,
            handle,
            state,
            alerts,
            run,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            backoff_interval: Duration::from_secs(DEFAULT_BACKOFF_INTERVAL_SECS),
        }
    }

    /// Overrides the poll and backoff intervals.
    #[must_use]
    pub const fn with_intervals(mut self, poll: Duration, backoff: Duration) -> Self {
        self.poll_interval = poll;
        self.backoff_interval = backoff;
        self
    }

    /// Runs the poll loop until stopped or superseded.
    pub async fn run(self) {
        info!(
            "Security monitor started for user {} (poll interval: {:?})",
            self.handle.user_id(),
            self.poll_interval
        );

        while self.state.is_current(self.run) {
            match self.detector.check(&self.handle).await {
                Ok(notifications) => {
                    self.state.mark_checked().await;
                    debug!("Security check complete: {} new event(s)", notifications.len());

                    for notification in notifications {
                        if let Err(e) = self.alerts.send(notification).await {
                            warn!("Failed to queue alert: {}", e);
                        }
                    }

                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    error!("Security check failed: {}", e);
                    tokio::time::sleep(self.backoff_interval).await;
                }
            }
        }

        info!("Security monitor stopped");
    }
}

impl<D> std::fmt::Debug for SecurityMonitor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityMonitor")
            .field("run", &self.run)
            .field("poll_interval", &self.poll_interval)
            .field("backoff_interval", &self.backoff_interval)
            .finish_non_exhaustive()
    }
}
