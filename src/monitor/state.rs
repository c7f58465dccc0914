//! Monitor state shared between the poll loop and the command layer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Process-wide monitoring state.
///
/// The active flag is the only signal the poll loop receives from the
/// command layer; it is read at the top of every cycle, so stop latency is
/// bounded by the remaining sleep interval. Each activation also bumps a
/// run token: a loop that wakes after a stop/start cycle sees the token
/// mismatch and exits, keeping at most one live loop per process.
#[derive(Debug, Default)]
pub struct MonitorState {
    active: AtomicBool,
    run_token: AtomicU64,
    last_checked: RwLock<Option<DateTime<Utc>>>,
}

impl MonitorState {
    /// Creates a new, inactive monitor state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips stopped → running.
    ///
    /// Returns the run token for the new poll loop, or `None` when
    /// monitoring is already active.
    pub fn try_activate(&self) -> Option<u64> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(self.run_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Requests the poll loop to stop before its next cycle.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Whether a poll loop is currently requested to run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// True while `run` is the live poll loop.
    #[must_use]
    pub fn is_current(&self, run: u64) -> bool {
        self.is_active() && self.run_token.load(Ordering::SeqCst) == run
    }

    /// Records the completion time of a detection check.
    pub async fn mark_checked(&self) {
        *self.last_checked.write().await = Some(Utc::now());
    }

    /// When the last successful check completed, if ever.
    pub async fn last_checked(&self) -> Option<DateTime<Utc>> {
        *self.last_checked.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        let state = MonitorState::new();
        assert!(!state.is_active());
    }

    #[test]
    fn test_activate_only_once() {
        let state = MonitorState::new();
        assert!(state.try_activate().is_some());
        assert!(state.try_activate().is_none());
        assert!(state.is_active());
    }

    #[test]
    fn test_restart_issues_fresh_token() {
        let state = MonitorState::new();
        let first = state.try_activate().unwrap();
        state.deactivate();
        let second = state.try_activate().unwrap();

        assert_ne!(first, second);
        assert!(state.is_current(second));
        // A loop still holding the first token must observe it is stale.
        assert!(!state.is_current(first));
    }

    #[test]
    fn test_deactivate_clears_current() {
        let state = MonitorState::new();
        let run = state.try_activate().unwrap();
        state.deactivate();
        assert!(!state.is_current(run));
    }

    #[tokio::test]
    async fn test_last_checked_starts_never() {
        let state = MonitorState::new();
        assert!(state.last_checked().await.is_none());

        state.mark_checked().await;
        assert!(state.last_checked().await.is_some());
    }
}
