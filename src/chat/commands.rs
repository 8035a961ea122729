//! Slash command parsing for the assistant.
//!
//! Commands start with `/` and control the application without being sent to
//! the model.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new chat after confirmation, saving the current one.
    New,

    /// Copy the latest summary to the clipboard.
    Copy,

    /// Print the whole transcript again.
    History,

    /// Show session status (model, turns, backend, cache, metrics).
    Status,

    /// Display help information.
    Help,

    /// Exit the application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use techreq::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/new"), Some(ChatCommand::New));
/// assert!(parse_command("I need a reporting dashboard").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "reset" => no_argument(ChatCommand::New, "/new", argument),
        "copy" => no_argument(ChatCommand::Copy, "/copy", argument),
        "history" => no_argument(ChatCommand::History, "/history", argument),
        "status" | "stats" => ChatCommand::Status,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("empty command; type /help for commands".to_string()),
        other => ChatCommand::Invalid(format!(
            "unknown command: /{other}; type /help for commands"
        )),
    };

    Some(result)
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{name} takes no arguments")),
    }
}

/// Returns true if `answer` confirms a yes/no prompt.
///
/// Only an explicit yes counts; an empty answer declines.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat (the current one is saved first)
  /copy                  Copy the latest summary to the clipboard
  /history               Show the conversation so far
  /status                Show model, backend, cache details and metrics
  /help                  Show this help message
  /quit                  Exit (also /exit, /q)

Enter sends a message. Shift+Enter or Alt+Enter starts a new line."#
}
