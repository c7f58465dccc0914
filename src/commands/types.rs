//! Command types and definitions.

use std::fmt;

/// Available bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the welcome/help message.
    Start,

    /// Begin the account login dialogue.
    Login,

    /// Activate security monitoring.
    Monitor,

    /// Deactivate security monitoring.
    Stop,

    /// Show login and monitoring status.
    Status,

    /// Abort an in-progress login dialogue.
    Cancel,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Commands are slash-prefixed, case-insensitive, may carry an
    /// `@botname` suffix and ignore trailing arguments. Returns `None`
    /// for anything else, including unknown commands.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let word = rest.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word).to_lowercase();

        match name.as_str() {
            "start" | "help" => Some(Self::Start),
            "login" | "connect" => Some(Self::Login),
            "monitor" | "watch" => Some(Self::Monitor),
            "stop" => Some(Self::Stop),
            "status" | "stat" => Some(Self::Status),
            "cancel" | "abort" => Some(Self::Cancel),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Login => "login",
            Self::Monitor => "monitor",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Cancel => "cancel",
        }
    }

    /// Returns all commands with their help descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/login", "Connect your account"),
            ("/monitor", "Start security monitoring"),
            ("/stop", "Stop security monitoring"),
            ("/status", "Show current status"),
            ("/cancel", "Abort an in-progress login"),
            ("/start", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of command execution, delivered as a reply message.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/login"), Some(BotCommand::Login));
        assert_eq!(BotCommand::parse("/monitor"), Some(BotCommand::Monitor));
        assert_eq!(BotCommand::parse("/stop"), Some(BotCommand::Stop));
        assert_eq!(BotCommand::parse("/status"), Some(BotCommand::Status));
        assert_eq!(BotCommand::parse("/cancel"), Some(BotCommand::Cancel));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(BotCommand::parse("/help"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/watch"), Some(BotCommand::Monitor));
        assert_eq!(BotCommand::parse("/abort"), Some(BotCommand::Cancel));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(BotCommand::parse("/STATUS"), Some(BotCommand::Status));
        assert_eq!(BotCommand::parse("/Login"), Some(BotCommand::Login));
    }

    #[test]
    fn test_parse_botname_suffix() {
        assert_eq!(
            BotCommand::parse("/monitor@sentinel_bot"),
            Some(BotCommand::Monitor)
        );
    }

    #[test]
    fn test_parse_ignores_trailing_arguments() {
        assert_eq!(BotCommand::parse("/status now"), Some(BotCommand::Status));
    }

    #[test]
    fn test_parse_with_extra_whitespace() {
        assert_eq!(BotCommand::parse("  /stop  "), Some(BotCommand::Stop));
    }

    #[test]
    fn test_parse_rejects_non_commands() {
        assert_eq!(BotCommand::parse("status"), None);
        assert_eq!(BotCommand::parse("hello world"), None);
        assert_eq!(BotCommand::parse("/"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn test_parse_rejects_unknown_commands() {
        assert_eq!(BotCommand::parse("/frobnicate"), None);
    }
}
