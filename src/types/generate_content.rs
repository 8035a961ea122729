use serde::{Deserialize, Serialize};

use crate::types::Content;

/// Request body for a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation so far, ending with the new user turn.
    pub contents: Vec<Content>,

    /// System instruction applied to the whole conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateContentRequest {
    /// Create a new request from a conversation.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
        }
    }

    /// Attach a system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::instruction(instruction));
        self
    }
}

/// A single candidate reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated turn.
    #[serde(default)]
    pub content: Option<Content>,

    /// Why generation stopped, e.g. `STOP` or `SAFETY`.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Feedback about the prompt, present when the prompt itself was blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked, if it was.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Response body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate replies; the first one is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Prompt feedback, if any.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Returns the text of the first candidate, or `None` if it has no text.
    pub fn text(&self) -> Option<String> {
        let text = self.candidates.first()?.content.as_ref()?.joined_text();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Returns the reason a reply is missing, for error messages.
    pub fn missing_text_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
        {
            Some(reason) => format!("response contained no text (finish reason: {reason})"),
            None => "response contained no text".to_string(),
        }
    }
}
