// Public modules
pub mod chat_turn;
pub mod content;
pub mod generate_content;
pub mod save_request;

// Re-exports
pub use chat_turn::{ChatTurn, Sender};
pub use content::{Content, Part, Role, history_from_transcript};
pub use generate_content::{
    Candidate, GenerateContentRequest, GenerateContentResponse, PromptFeedback,
};
pub use save_request::SaveRequest;
