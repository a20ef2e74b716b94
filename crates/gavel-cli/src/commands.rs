//! Command parsing for the line-oriented client.
//!
//! This module parses input lines into structured [`Command`] values.

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a bid.
    Bid {
        /// Amount as typed; validated by the session.
        amount: String,
    },

    /// Re-render the current view.
    Status,

    /// Show available commands.
    Help,

    /// Stop the session and exit.
    Quit,

    /// Blank line.
    Empty,

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Usage text listing every command.
pub const HELP: &str = "commands: <amount> | /bid <amount> | /status | /help | /quit";

/// Parse a user input line into a command.
///
/// Commands start with `/`. Anything else is treated as a bid amount.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() {
        return Command::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Bid { amount: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "bid" | "b" => match parts.as_slice() {
            [_, amount] => Command::Bid { amount: (*amount).to_string() },
            [_] => Command::InvalidArgs {
                command: "bid".into(),
                error: "Usage: /bid <amount>".into(),
            },
            _ => Command::InvalidArgs { command: "bid".into(), error: "Too many arguments".into() },
        },

        "status" | "s" => Command::Status,

        "help" | "h" | "?" => Command::Help,

        "quit" | "q" | "exit" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}
