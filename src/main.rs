//! Sentinel Bot - Main Entry Point
//!
//! A Telegram bot that connects to an external account service and
//! reports security events back through chat alerts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use sentinel_bot::account::{HttpAccountClient, HttpSecurityDetector};
use sentinel_bot::commands::CommandHandler;
use sentinel_bot::config::{MonitorSettings, TelegramConfig};
use sentinel_bot::dialogue::{LoginController, SessionMap};
use sentinel_bot::monitor::{MonitorState, Notification};
use sentinel_bot::telegram::{AlertNotifier, TelegramBot, Update};

/// Telegram bot for account security monitoring.
#[derive(Parser, Debug)]
#[command(name = "sentinel_bot")]
#[command(about = "Watch an external account for security events from Telegram")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

type Handler = CommandHandler<HttpAccountClient, HttpSecurityDetector>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations; a missing bot token aborts startup here
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = MonitorSettings::from_env_with_defaults();

    if settings.account_api_url.is_none() {
        warn!("ACCOUNT_API_URL is not set; /login will be unavailable");
    }

    // Connect to Telegram
    let bot = TelegramBot::connect(&tg_config, settings.alert_min_interval_secs)
        .await
        .context("Failed to connect to Telegram")?;

    // Handle bot authentication if needed
    if !bot.is_authorized().await.context("Failed to check authorization")? {
        bot.sign_in_bot(&tg_config.bot_token, &tg_config.api_hash)
            .await
            .context("Bot sign-in failed")?;
    }

    let bot = Arc::new(bot);
    let sessions = Arc::new(SessionMap::new());
    let monitor = Arc::new(MonitorState::new());

    // Create the alert channel bridging the monitor task to the notifier
    let (alert_tx, alert_rx) = mpsc::channel::<Notification>(32);

    let client = settings
        .account_api_url
        .as_deref()
        .map(|url| Arc::new(HttpAccountClient::new(url)));
    let detector = settings
        .account_api_url
        .as_deref()
        .map(|url| Arc::new(HttpSecurityDetector::new(url)));

    let controller = LoginController::new(
        client,
        Arc::clone(&sessions),
        Duration::from_secs(settings.auth_timeout_secs),
    );

    let handler = CommandHandler::new(
        controller,
        detector,
        Arc::clone(&sessions),
        Arc::clone(&monitor),
        alert_tx.clone(),
        &settings,
    );

    // Spawn the notifier task draining alerts on this runtime
    let notifier = AlertNotifier::new(Arc::clone(&bot), tg_config.alert_chat_id);
    let notifier_task = tokio::spawn(notifier.run(alert_rx));

    info!("Bot is running. Use Ctrl+C to stop.");

    tokio::select! {
        () = dispatch_updates(&bot, &handler) => {
            warn!("Update stream ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    // Cleanup: stop the poller, close the alert channel, drain the notifier
    info!("Shutting down...");
    monitor.deactivate();
    drop(handler);
    drop(alert_tx);
    let _ = notifier_task.await;
    bot.disconnect();

    Ok(())
}

/// Receives updates and dispatches inbound messages to the command handler.
async fn dispatch_updates(bot: &Arc<TelegramBot>, handler: &Handler) {
    while let Some(update) = bot.next_update().await {
        let Update::NewMessage(message) = update else {
            continue;
        };
        if message.outgoing() {
            continue;
        }

        let chat_id = message.chat().id();
        let Some(result) = handler.handle_message(chat_id, message.text()).await else {
            continue;
        };

        if !result.success {
            debug!("Command failed for chat {}: {}", chat_id, result.message);
        }

        if let Err(e) = message.respond(result.message.as_str()).await {
            error!("Failed to send reply to chat {}: {}", chat_id, e);
        }
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
