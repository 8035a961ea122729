//! Chat session management on top of a [`ChatProvider`].
//!
//! A [`ChatSession`] is the owned handle to one remote conversation: the model,
//! the system instruction, and the history the model has seen. The
//! [`ChatAdapter`] creates sessions and sends messages on them.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::types::{ChatTurn, Content, GenerateContentRequest, history_from_transcript};

/// Prefix of the reply returned when an exchange fails.
pub const SEND_FAILURE_PREFIX: &str = "Error communicating with AI:";

const UNKNOWN_SEND_FAILURE: &str = "An unknown error occurred while communicating with the AI.";

/// Outcome of [`ChatAdapter::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReply {
    /// Text of the assistant turn.
    pub text: String,
    /// True when the exchange failed and `text` describes the failure.
    pub failed: bool,
}

/// A hosted model that can continue a conversation.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Checks that the provider is configured well enough to start a session.
    fn validate(&self) -> Result<()>;

    /// Runs one round trip and returns the reply text.
    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<String>;
}

/// Owned handle to one remote conversation.
///
/// History grows only when an exchange succeeds, so a failed send leaves the
/// session exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    model: String,
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    /// Returns the model this session talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the history the model has seen so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    fn request_for(&self, text: &str) -> GenerateContentRequest {
        let mut contents = self.history.clone();
        contents.push(Content::user(text));
        GenerateContentRequest::new(contents).with_system_instruction(self.system_instruction.clone())
    }
}

/// Starts sessions and relays messages to a [`ChatProvider`].
#[derive(Clone)]
pub struct ChatAdapter {
    provider: Arc<dyn ChatProvider>,
    model: String,
    system_instruction: String,
}

impl ChatAdapter {
    /// Creates a new adapter for the given provider and model.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_instruction: system_instruction.into(),
        }
    }

    /// Returns the configured model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Starts a new session, optionally seeded with an earlier transcript.
    ///
    /// `prior_turns` is a full transcript; its leading greeting is dropped.
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the provider is not usable.
    pub fn start_session(&self, prior_turns: Option<&[ChatTurn]>) -> Result<ChatSession> {
        self.provider.validate()?;
        let history = prior_turns.map(history_from_transcript).unwrap_or_default();
        debug!(
            model = %self.model,
            history_len = history.len(),
            "starting chat session"
        );
        Ok(ChatSession {
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            history,
        })
    }

    /// Sends `text` as the next user turn and returns the reply.
    ///
    /// On success both the user turn and the reply are appended to the
    /// session history.
    pub async fn try_send(&self, session: &mut ChatSession, text: &str) -> Result<String> {
        let request = session.request_for(text);
        let reply = self.provider.generate(&session.model, &request).await?;
        session.history.push(Content::user(text));
        session.history.push(Content::model(reply.clone()));
        Ok(reply)
    }

    /// Sends `text` and returns the reply, or a readable error string.
    ///
    /// This never fails; a failed exchange yields text starting with
    /// [`SEND_FAILURE_PREFIX`] and sets [`SendReply::failed`] so the
    /// conversation can carry on.
    pub async fn send(&self, session: &mut ChatSession, text: &str) -> SendReply {
        match self.try_send(session, text).await {
            Ok(text) => SendReply {
                text,
                failed: false,
            },
            Err(err) => SendReply {
                text: send_failure_text(&err),
                failed: true,
            },
        }
    }
}

/// Renders a failed exchange as assistant text.
pub fn send_failure_text(err: &Error) -> String {
    error!(error = %err, "error sending message to model");
    let details = err.message().trim();
    if details.is_empty() {
        UNKNOWN_SEND_FAILURE.to_string()
    } else {
        format!("{SEND_FAILURE_PREFIX} {details}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted results and records requests.
    pub(crate) struct ScriptedProvider {
        pub(crate) valid: bool,
        replies: Mutex<VecDeque<Result<String>>>,
        pub(crate) requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                valid: true,
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn unconfigured() -> Self {
            Self {
                valid: false,
                ..Self::new(vec![])
            }
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ChatProvider for ScriptedProvider {
        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                Err(Error::initialization(
                    "API_KEY environment variable is not set.",
                ))
            }
        }

        async fn generate(&self, _: &str, request: &GenerateContentRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::send("no scripted reply", None)))
        }
    }

    fn adapter(provider: Arc<ScriptedProvider>) -> ChatAdapter {
        ChatAdapter::new(provider, "test-model", "system text")
    }

    #[test]
    fn start_session_maps_prior_turns() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let turns = vec![
            ChatTurn::assistant("greeting"),
            ChatTurn::user("I need a dashboard"),
            ChatTurn::assistant("Who is it for?"),
        ];
        let session = adapter(provider).start_session(Some(turns.as_slice())).unwrap();
        assert_eq!(session.model(), "test-model");
        assert_eq!(
            session.history(),
            &[
                Content::user("I need a dashboard"),
                Content::model("Who is it for?")
            ]
        );
    }

    #[test]
    fn start_session_without_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let session = adapter(provider).start_session(None).unwrap();
        assert!(session.history().is_empty());
    }

    #[test]
    fn start_session_propagates_rejection() {
        let provider = Arc::new(ScriptedProvider::unconfigured());
        let err = adapter(provider).start_session(None).unwrap_err();
        assert!(err.is_initialization());
    }

    #[tokio::test]
    async fn send_appends_exchange_to_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("Tell me more.".into())]));
        let adapter = adapter(provider.clone());
        let mut session = adapter.start_session(None).unwrap();

        let reply = adapter.send(&mut session, "A report").await;
        assert_eq!(
            reply,
            SendReply {
                text: "Tell me more.".to_string(),
                failed: false,
            }
        );
        assert_eq!(
            session.history(),
            &[Content::user("A report"), Content::model("Tell me more.")]
        );

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].contents, vec![Content::user("A report")]);
        assert_eq!(
            requests[0].system_instruction,
            Some(Content::instruction("system text"))
        );
    }

    #[tokio::test]
    async fn send_failure_is_returned_as_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(Error::send(
            "[503 UNAVAILABLE] overloaded",
            Some(503),
        ))]));
        let adapter = adapter(provider);
        let mut session = adapter.start_session(None).unwrap();

        let reply = adapter.send(&mut session, "hello").await;
        assert!(reply.failed);
        assert!(reply.text.starts_with("Error communicating with AI:"));
        assert!(reply.text.contains("overloaded"));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn always_failing_provider_never_raises() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let adapter = adapter(provider);
        let mut session = adapter.start_session(None).unwrap();
        for _ in 0..3 {
            let reply = adapter.send(&mut session, "hello").await;
            assert!(reply.failed);
            assert!(reply.text.starts_with(SEND_FAILURE_PREFIX));
        }
    }

    #[test]
    fn empty_error_message_uses_generic_text() {
        let text = send_failure_text(&Error::send("", None));
        assert_eq!(text, UNKNOWN_SEND_FAILURE);
    }
}
