//! Terminal rendering for the assistant.
//!
//! Rendering is split in two: pure `format_*` functions that turn turns and
//! notifications into strings, and the [`Renderer`] trait that decides where
//! those strings go. [`PlainTextRenderer`] writes to stdout with optional ANSI
//! styling.

use std::io::{self, Stdout, Write};

use crate::format::{Block, Inline, is_summary, render_blocks};
use crate::notify::{Notification, NotificationLevel};
use crate::types::{ChatTurn, Sender};

/// ANSI escape code for bold text (headings, inline bold, labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (loading line, separators, hints).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (assistant label, saved notices).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (retry notices).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (errors).
const ANSI_RED: &str = "\x1b[31m";

/// Carriage return plus erase-line, used to remove the loading line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Title shown when the application starts.
pub const BANNER_TITLE: &str = "Tech Spec Generator";

/// Hint shown under the title.
pub const BANNER_HINT: &str =
    "Enter sends. Shift+Enter or Alt+Enter starts a new line. Type /help for commands.";

/// Text shown while a reply is outstanding.
pub const LOADING_TEXT: &str = "Assistant is writing...";

/// Hint appended to summaries.
pub const COPY_HINT: &str = "Type /copy to copy this summary to the clipboard.";

const SEPARATOR_WIDTH: usize = 40;

/// Trait for rendering the conversation and its surroundings.
pub trait Renderer: Send {
    /// Prints the title banner.
    fn print_banner(&mut self);

    /// Prints one turn of the conversation.
    fn print_turn(&mut self, turn: &ChatTurn);

    /// Shows the loading indicator.
    fn print_loading(&mut self);

    /// Removes the loading indicator.
    fn finish_loading(&mut self);

    /// Prints an error message.
    fn print_error(&mut self, error: &str);

    /// Prints an informational message.
    fn print_info(&mut self, info: &str);

    /// Prints a background notification.
    fn print_notification(&mut self, notification: &Notification);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    loading: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            loading: false,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_banner(&mut self) {
        println!("{}", format_banner(self.use_color));
    }

    fn print_turn(&mut self, turn: &ChatTurn) {
        self.finish_loading();
        println!("{}", format_turn(turn, self.use_color));
        self.flush();
    }

    fn print_loading(&mut self) {
        if self.use_color {
            print!("{ANSI_DIM}{LOADING_TEXT}{ANSI_RESET}");
        } else {
            print!("{LOADING_TEXT}");
        }
        self.loading = true;
        self.flush();
    }

    fn finish_loading(&mut self) {
        if !self.loading {
            return;
        }
        if self.use_color {
            print!("{ANSI_CLEAR_LINE}");
        } else {
            println!();
        }
        self.loading = false;
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.finish_loading();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.finish_loading();
        println!("{info}");
    }

    fn print_notification(&mut self, notification: &Notification) {
        self.finish_loading();
        println!("{}", format_notification(notification, self.use_color));
    }
}

/// Formats the title banner.
pub fn format_banner(use_color: bool) -> String {
    if use_color {
        format!("{ANSI_BOLD}{BANNER_TITLE}{ANSI_RESET}\n{ANSI_DIM}{BANNER_HINT}{ANSI_RESET}\n")
    } else {
        format!("{BANNER_TITLE}\n{BANNER_HINT}\n")
    }
}

/// Formats a turn as a labelled block of text.
///
/// User turns are printed verbatim. Assistant turns go through
/// [`render_blocks`], and summaries get a copy hint.
pub fn format_turn(turn: &ChatTurn, use_color: bool) -> String {
    let mut out = String::new();
    let label = turn.sender().label();
    if use_color {
        let color = match turn.sender() {
            Sender::User => ANSI_CYAN,
            Sender::Assistant => ANSI_GREEN,
        };
        out.push_str(&format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET}\n"));
    } else {
        out.push_str(&format!("{label}:\n"));
    }

    match turn.sender() {
        Sender::User => {
            for line in turn.text().lines() {
                out.push_str(line);
                out.push('\n');
            }
        }
        Sender::Assistant => {
            for block in render_blocks(turn.text()) {
                format_block(&mut out, &block, use_color);
            }
        }
    }

    if is_summary(turn) {
        if use_color {
            out.push_str(&format!("{ANSI_DIM}{COPY_HINT}{ANSI_RESET}\n"));
        } else {
            out.push_str(COPY_HINT);
            out.push('\n');
        }
    }
    out
}

/// Formats a notification with its level tag.
pub fn format_notification(notification: &Notification, use_color: bool) -> String {
    if !use_color {
        return notification.to_string();
    }
    let color = match notification.level {
        NotificationLevel::Info => ANSI_DIM,
        NotificationLevel::Success => ANSI_GREEN,
        NotificationLevel::Warning => ANSI_YELLOW,
        NotificationLevel::Error => ANSI_RED,
    };
    format!("{color}{notification}{ANSI_RESET}")
}

fn format_block(out: &mut String, block: &Block, use_color: bool) {
    match block {
        Block::Heading(title) => {
            if use_color {
                out.push_str(&format!("{ANSI_BOLD}{title}{ANSI_RESET}\n"));
            } else {
                out.push_str(title);
                out.push('\n');
            }
        }
        Block::Paragraph(spans) => {
            format_spans(out, spans, use_color);
            out.push('\n');
        }
        Block::List(items) => {
            let bullet = if use_color { "\u{2022}" } else { "-" };
            for item in items {
                out.push_str(&format!("  {bullet} "));
                format_spans(out, item, use_color);
                out.push('\n');
            }
        }
        Block::Separator => {
            if use_color {
                let rule = "\u{2500}".repeat(SEPARATOR_WIDTH);
                out.push_str(&format!("{ANSI_DIM}{rule}{ANSI_RESET}\n"));
            } else {
                out.push_str(&"-".repeat(SEPARATOR_WIDTH));
                out.push('\n');
            }
        }
    }
}

fn format_spans(out: &mut String, spans: &[Inline], use_color: bool) {
    for span in spans {
        match span {
            Inline::Plain(text) => out.push_str(text),
            Inline::Bold(text) if use_color => {
                out.push_str(&format!("{ANSI_BOLD}{text}{ANSI_RESET}"));
            }
            Inline::Bold(text) => out.push_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_is_verbatim() {
        let turn = ChatTurn::user("- not a list\n**not a heading**");
        assert_eq!(
            format_turn(&turn, false),
            "You:\n- not a list\n**not a heading**\n"
        );
    }

    #[test]
    fn assistant_turn_is_formatted() {
        let turn = ChatTurn::assistant("**Goals**\n- **Speed:** fast\n- cheap\nThanks.");
        assert_eq!(
            format_turn(&turn, false),
            "Assistant:\nGoals\n  - Speed: fast\n  - cheap\nThanks.\n"
        );
    }

    #[test]
    fn summary_gets_copy_hint() {
        let turn = ChatTurn::assistant("Here it is.\n---\n**Title**");
        let text = format_turn(&turn, false);
        assert!(text.contains(&"-".repeat(SEPARATOR_WIDTH)));
        assert!(text.ends_with(&format!("{COPY_HINT}\n")));
    }

    #[test]
    fn plain_turn_has_no_hint() {
        let text = format_turn(&ChatTurn::assistant("Who are the users?"), false);
        assert!(!text.contains(COPY_HINT));
    }

    #[test]
    fn color_output_styles_bold_and_labels() {
        let text = format_turn(&ChatTurn::assistant("a **b** c"), true);
        assert!(text.starts_with(&format!("{ANSI_BOLD}{ANSI_GREEN}Assistant:")));
        assert!(text.contains(&format!("a {ANSI_BOLD}b{ANSI_RESET} c")));
    }

    #[test]
    fn no_color_output_has_no_escapes() {
        let turn = ChatTurn::assistant("**T**\n- x\n---\ny");
        assert!(!format_turn(&turn, false).contains('\x1b'));
        assert!(!format_banner(false).contains('\x1b'));
        assert!(!format_notification(&Notification::error("x"), false).contains('\x1b'));
    }

    #[test]
    fn notification_colors_follow_level() {
        let text = format_notification(&Notification::warning("again"), true);
        assert_eq!(text, format!("{ANSI_YELLOW}[retrying] again{ANSI_RESET}"));
    }

    #[test]
    fn banner_names_the_tool() {
        assert!(format_banner(false).starts_with(BANNER_TITLE));
    }
}
