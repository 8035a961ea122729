//! Turns raw assistant text into display blocks.
//!
//! The model answers in a small markdown-like dialect: `**Title**` lines are
//! headings, `- ` or `* ` lines are bullets, `---` is a separator, and
//! `**bold**` may appear inline. [`render_blocks`] recognizes exactly that and
//! nothing more; everything else is a paragraph.

use crate::types::ChatTurn;

/// Marker that separates sections of a summary.
pub const SEPARATOR: &str = "---";

/// A run of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Unstyled text.
    Plain(String),
    /// Text that was wrapped in `**`.
    Bold(String),
}

/// A display block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A line of text.
    Paragraph(Vec<Inline>),
    /// Consecutive bullet lines.
    List(Vec<Vec<Inline>>),
    /// A line consisting only of bold text.
    Heading(String),
    /// A horizontal rule.
    Separator,
}

/// Splits `text` into display blocks.
pub fn render_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut list: Vec<Vec<Inline>> = Vec::new();

    fn flush(blocks: &mut Vec<Block>, list: &mut Vec<Vec<Inline>>) {
        if !list.is_empty() {
            blocks.push(Block::List(std::mem::take(list)));
        }
    }

    for line in text.split('\n') {
        if line.trim() == SEPARATOR {
            flush(&mut blocks, &mut list);
            blocks.push(Block::Separator);
            continue;
        }
        if let Some(title) = heading(line) {
            flush(&mut blocks, &mut list);
            blocks.push(Block::Heading(title.to_string()));
            continue;
        }
        if let Some(item) = list_item(line) {
            list.push(parse_inline(item));
            continue;
        }
        flush(&mut blocks, &mut list);
        if !line.trim().is_empty() {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }
    flush(&mut blocks, &mut list);

    blocks
}

/// Returns true if the turn looks like a finished summary worth copying.
///
/// Summaries are the only replies that contain a separator line.
pub fn is_summary(turn: &ChatTurn) -> bool {
    turn.is_assistant() && turn.text().contains(SEPARATOR)
}

/// Splits a line into plain and bold runs.
///
/// A bold run is `**`, one or more characters other than `*`, then `**`.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'*' {
            let inner_start = i + 2;
            let mut j = inner_start;
            while j < bytes.len() && bytes[j] != b'*' {
                j += 1;
            }
            if j > inner_start && j + 1 < bytes.len() && bytes[j + 1] == b'*' {
                if plain_start < i {
                    out.push(Inline::Plain(line[plain_start..i].to_string()));
                }
                out.push(Inline::Bold(line[inner_start..j].to_string()));
                i = j + 2;
                plain_start = i;
                continue;
            }
        }
        i += 1;
    }
    if plain_start < line.len() {
        out.push(Inline::Plain(line[plain_start..].to_string()));
    }
    out
}

fn heading(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.len() < 4 || !trimmed.starts_with("**") || !trimmed.ends_with("**") {
        return None;
    }
    let inner = &trimmed[2..trimmed.len() - 2];
    if inner.is_empty() { None } else { Some(inner) }
}

fn list_item(line: &str) -> Option<&str> {
    let rest = line.trim_start();
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('*' | '-'), Some(space)) if space.is_whitespace() => {
            Some(&rest[1 + space.len_utf8()..])
        }
        _ => None,
    }
}
