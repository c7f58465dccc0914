//! Command handler implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::types::{BotCommand, CommandResult};
use crate::account::AccountClient;
use crate::config::MonitorSettings;
use crate::dialogue::{LoginController, SessionMap};
use crate::monitor::{MonitorState, Notification, SecurityDetector, SecurityMonitor};

/// Handles bot commands and free-text dialogue input.
pub struct CommandHandler<C, D> {
    /// Login dialogue controller.
    controller: LoginController<C>,

    /// Detection capability; `None` when no account service is configured.
    detector: Option<Arc<D>>,

    /// Shared session registry.
    sessions: Arc<SessionMap>,

    /// Shared monitoring state.
    monitor: Arc<MonitorState>,

    /// Channel feeding the alert notifier.
    alerts: mpsc::Sender<Notification>,

    /// Sleep after a successful poll cycle.
    poll_interval: Duration,

    /// Sleep after a failed poll cycle.
    backoff_interval: Duration,
}

impl<C, D> CommandHandler<C, D>
where
    C: AccountClient,
    D: SecurityDetector + Send + Sync + 'static,
{
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        controller: LoginController<C>,
        detector: Option<Arc<D>>,
        sessions: Arc<SessionMap>,
        monitor: Arc<MonitorState>,
        alerts: mpsc::Sender<Notification>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            controller,
            detector,
            sessions,
            monitor,
            alerts,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            backoff_interval: Duration::from_secs(settings.backoff_interval_secs),
        }
    }

    /// Processes one inbound message.
    ///
    /// Returns `None` when the message warrants no reply: unknown
    /// commands and free text outside a dialogue stage.
    pub async fn handle_message(&self, chat_id: i64, text: &str) -> Option<CommandResult> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // Slash messages are command territory; they are never fed into
        // the dialogue, so /cancel works mid-login.
        if text.starts_with('/') {
            let command = BotCommand::parse(text)?;
            debug!("Handling command {} from chat {}", command, chat_id);
            return Some(self.execute(chat_id, command).await);
        }

        self.controller.handle_text(chat_id, text).await
    }

    /// Executes a parsed command.
    async fn execute(&self, chat_id: i64, command: BotCommand) -> CommandResult {
        match command {
            BotCommand::Start => self.handle_start(),
            BotCommand::Login => self.controller.begin(chat_id).await,
            BotCommand::Cancel => self.controller.cancel(chat_id).await,
            BotCommand::Monitor => self.handle_monitor(chat_id).await,
            BotCommand::Stop => self.handle_stop(),
            BotCommand::Status => self.handle_status(chat_id).await,
        }
    }

    #[allow(clippy::unused_self)]
    fn handle_start(&self) -> CommandResult {
        let mut lines = vec![
            "Account security monitor".to_owned(),
            String::new(),
            "I watch your account for new security events and alert you here.".to_owned(),
            String::new(),
            "1. Connect your account with /login".to_owned(),
            "2. Start monitoring with /monitor".to_owned(),
            "3. You will be alerted when something happens".to_owned(),
            String::new(),
            "Commands:".to_owned(),
        ];

        for (cmd, desc) in BotCommand::all_commands() {
            lines.push(format!("  {cmd} - {desc}"));
        }

        CommandResult::success(lines.join("\n"))
    }

    async fn handle_monitor(&self, chat_id: i64) -> CommandResult {
        let Some(handle) = self.sessions.handle(chat_id).await else {
            return CommandResult::error("Not logged in. Use /login first.");
        };

        let Some(detector) = &self.detector else {
            return CommandResult::error(
                "Monitoring is not available: no account service is configured.",
            );
        };

        let Some(run) = self.monitor.try_activate() else {
            return CommandResult::error("Monitoring already active.");
        };

        let task = SecurityMonitor::new(
            Arc::clone(detector),
            handle,
            Arc::clone(&self.monitor),
            self.alerts.clone(),
            run,
        )
        .with_intervals(self.poll_interval, self.backoff_interval);

        tokio::spawn(task.run());
        info!("Monitoring activated by chat {}", chat_id);

        CommandResult::success(
            "Security monitoring started.\n\n\
             You will be alerted about new security events on your account.\n\
             Use /stop to end monitoring.",
        )
    }

    fn handle_stop(&self) -> CommandResult {
        if !self.monitor.is_active() {
            return CommandResult::error("Monitoring is not active.");
        }

        self.monitor.deactivate();
        CommandResult::success("Security monitoring stopped.")
    }

    async fn handle_status(&self, chat_id: i64) -> CommandResult {
        let account = if self.sessions.is_authenticated(chat_id).await {
            "connected"
        } else {
            "not connected"
        };

        let monitoring = if self.monitor.is_active() {
            "active"
        } else {
            "inactive"
        };

        let last_check = self.monitor.last_checked().await.map_or_else(
            || "never".to_owned(),
            |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        CommandResult::success(format!(
            "Status\n\
             Account: {account}\n\
             Monitoring: {monitoring}\n\
             Last check: {last_check}"
        ))
    }
}

impl<C, D> std::fmt::Debug for CommandHandler<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("poll_interval", &self.poll_interval)
            .field("backoff_interval", &self.backoff_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::account::{AccountClient, AccountError, AccountHandle};

    const CHAT: i64 = 42;

    struct MockAccountClient {
        calls: Mutex<Vec<(String, String)>>,
        fail_with: Option<String>,
    }

    impl MockAccountClient {
        fn accepting() -> Self {
            Self {
                calls: Mutex::new(vec![]),
                fail_with: None,
            }
        }

        fn rejecting(message: &str) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                fail_with: Some(message.to_owned()),
            }
        }
    }

    impl AccountClient for MockAccountClient {
        async fn authenticate(
            &self,
            identifier: &str,
            secret: &str,
        ) -> Result<AccountHandle, AccountError> {
            self.calls
                .lock()
                .unwrap()
                .push((identifier.to_owned(), secret.to_owned()));
            match &self.fail_with {
                Some(message) => Err(AccountError::Auth(message.clone())),
                None => Ok(AccountHandle::new(1, identifier, "token")),
            }
        }
    }

    struct IdleDetector {
        calls: AtomicUsize,
    }

    impl SecurityDetector for IdleDetector {
        async fn check(&self, _handle: &AccountHandle) -> Result<Vec<Notification>, AccountError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    fn handler(
        client: MockAccountClient,
    ) -> (
        CommandHandler<MockAccountClient, IdleDetector>,
        Arc<MonitorState>,
    ) {
        let sessions = Arc::new(SessionMap::new());
        let monitor = Arc::new(MonitorState::new());
        let controller = LoginController::new(
            Some(Arc::new(client)),
            Arc::clone(&sessions),
            Duration::from_secs(5),
        );
        let (alert_tx, _alert_rx) = mpsc::channel(8);
        let handler = CommandHandler::new(
            controller,
            Some(Arc::new(IdleDetector {
                calls: AtomicUsize::new(0),
            })),
            sessions,
            Arc::clone(&monitor),
            alert_tx,
            &MonitorSettings::default(),
        );
        (handler, monitor)
    }

    async fn send(
        handler: &CommandHandler<MockAccountClient, IdleDetector>,
        text: &str,
    ) -> CommandResult {
        handler.handle_message(CHAT, text).await.unwrap()
    }

    #[tokio::test]
    async fn test_failed_login_then_monitor_reports_not_logged_in() {
        let (handler, monitor) = handler(MockAccountClient::rejecting("bad credentials"));

        send(&handler, "/login").await;
        send(&handler, "alice").await;
        let failure = send(&handler, "wrongpass").await;
        assert!(!failure.success);
        assert!(failure.message.contains("bad credentials"));

        let result = send(&handler, "/monitor").await;
        assert!(!result.success);
        assert!(result.message.contains("Not logged in"));
        assert!(!monitor.is_active());
    }

    #[tokio::test]
    async fn test_login_monitor_status_happy_path() {
        let (handler, monitor) = handler(MockAccountClient::accepting());

        send(&handler, "/login").await;
        send(&handler, "alice").await;
        let login = send(&handler, "correctpass").await;
        assert!(login.success);

        let started = send(&handler, "/monitor").await;
        assert!(started.success);

        let status = send(&handler, "/status").await;
        assert!(status.message.contains("Account: connected"));
        assert!(status.message.contains("Monitoring: active"));

        monitor.deactivate();
    }

    #[tokio::test]
    async fn test_monitor_twice_reports_already_active() {
        let (handler, monitor) = handler(MockAccountClient::accepting());

        send(&handler, "/login").await;
        send(&handler, "alice").await;
        send(&handler, "correctpass").await;

        assert!(send(&handler, "/monitor").await.success);
        let second = send(&handler, "/monitor").await;
        assert!(!second.success);
        assert!(second.message.contains("already active"));

        monitor.deactivate();
    }

    #[tokio::test]
    async fn test_stop_then_status_reports_inactive() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        send(&handler, "/login").await;
        send(&handler, "alice").await;
        send(&handler, "correctpass").await;
        send(&handler, "/monitor").await;

        assert!(send(&handler, "/stop").await.success);
        let status = send(&handler, "/status").await;
        assert!(status.message.contains("Monitoring: inactive"));
    }

    #[tokio::test]
    async fn test_stop_when_not_running_is_an_error() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        let result = send(&handler, "/stop").await;
        assert!(!result.success);
        assert!(result.message.contains("not active"));
    }

    #[tokio::test]
    async fn test_status_before_any_check_says_never() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        let status = send(&handler, "/status").await;
        assert!(status.message.contains("Account: not connected"));
        assert!(status.message.contains("Last check: never"));
    }

    #[tokio::test]
    async fn test_unknown_command_and_idle_chatter_get_no_reply() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        assert!(handler.handle_message(CHAT, "/frobnicate").await.is_none());
        assert!(handler.handle_message(CHAT, "hello").await.is_none());
        assert!(handler.handle_message(CHAT, "   ").await.is_none());
    }

    #[tokio::test]
    async fn test_start_lists_command_surface() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        let help = send(&handler, "/start").await;
        assert!(help.message.contains("/login"));
        assert!(help.message.contains("/monitor"));
        assert!(help.message.contains("/status"));
    }

    #[tokio::test]
    async fn test_cancel_mid_dialogue_via_command_path() {
        let (handler, _monitor) = handler(MockAccountClient::accepting());

        send(&handler, "/login").await;
        send(&handler, "alice").await;
        let cancelled = send(&handler, "/cancel").await;
        assert!(cancelled.success);

        // The secret-looking text now has no dialogue to land in.
        assert!(handler.handle_message(CHAT, "hunter2").await.is_none());
    }
}
