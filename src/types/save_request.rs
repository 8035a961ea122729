use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ChatTurn;

/// Body of a transcript save.
///
/// The client never assigns an identifier; the receiving service does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// The full transcript, greeting included.
    pub messages: Vec<ChatTurn>,

    /// When the save was requested.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

impl SaveRequest {
    /// Create a save request stamped with the current time.
    pub fn now(messages: &[ChatTurn]) -> Self {
        Self::at(messages, OffsetDateTime::now_utc())
    }

    /// Create a save request stamped with the given time.
    pub fn at(messages: &[ChatTurn], timestamp: OffsetDateTime) -> Self {
        Self {
            messages: messages.to_vec(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};
    use time::macros::datetime;

    #[test]
    fn wire_format() {
        let request = SaveRequest::at(
            &[ChatTurn::assistant("greeting"), ChatTurn::user("hello")],
            datetime!(2025-01-02 03:04:05.678 UTC),
        );
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "messages": [
                    {"sender": "assistant", "text": "greeting"},
                    {"sender": "user", "text": "hello"}
                ],
                "timestamp": "2025-01-02T03:04:05.678Z"
            })
        );
    }
}
