//! Command handling module.
//!
//! Parses slash commands sent to the bot via chat messages and dispatches
//! them to the dialogue controller and the security monitor.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandResult};
