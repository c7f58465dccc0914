//! Telegram transport module.
//!
//! Provides the grammers-based client wrapper used by the front end:
//! bot sign-in, inbound update stream, replies, and rate-limited
//! out-of-band alert delivery.

mod client;
mod notifier;
mod rate_limiter;

pub use client::{TelegramBot, TelegramError};
pub use grammers_client::update::Update;
pub use notifier::AlertNotifier;
pub use rate_limiter::RateLimiter;
