use serde::{Deserialize, Serialize};

/// Author of a chat turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person using the assistant.
    User,

    /// The model, or a message synthesized on its behalf.
    #[serde(alias = "ai")]
    Assistant,
}

impl Sender {
    /// Returns the display label for this sender.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

/// One message in a conversation.
///
/// Turns are immutable once created; a transcript is an ordered `Vec` of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    sender: Sender,
    text: String,
}

impl ChatTurn {
    /// Create a new turn.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create a new assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    /// Returns who authored this turn.
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the text of this turn.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if the assistant authored this turn.
    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}
