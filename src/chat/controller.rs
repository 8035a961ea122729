//! Application state and orchestration.
//!
//! The [`Controller`] owns the transcript and the live [`ChatSession`]. It is
//! the only thing that mutates either, and it writes the transcript to the
//! [`LocalCache`] after every change.

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::cache::LocalCache;
use crate::chat::adapter::{ChatAdapter, ChatSession};
use crate::chat::prompt::GREETING;
use crate::error::Result;
use crate::format::is_summary;
use crate::persistence::PersistenceClient;
use crate::types::ChatTurn;

const NOT_INITIALIZED: &str = "Chat session is not initialized.";

/// Whether a reply is outstanding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Ready for input.
    Idle,
    /// A message has been sent and the reply has not arrived.
    AwaitingResponse,
}

/// Outcome of the last attempt to start a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A live session exists.
    Initialized,
    /// Session start failed; sends are answered with an error turn.
    InitializationFailed,
}

/// Owns the conversation and coordinates the adapter, cache and saves.
pub struct Controller {
    adapter: ChatAdapter,
    persistence: PersistenceClient,
    cache: LocalCache,
    transcript: Vec<ChatTurn>,
    session: Option<ChatSession>,
    session_state: SessionState,
    phase: Phase,
    error: Option<String>,
    pending_saves: Vec<JoinHandle<Result<Value>>>,
}

impl Controller {
    /// Restores the cached transcript, or starts from the greeting, and opens
    /// a session seeded with it.
    ///
    /// Session start failure is not an error here: it is recorded as
    /// [`SessionState::InitializationFailed`] and shown as an assistant turn.
    pub fn mount(adapter: ChatAdapter, persistence: PersistenceClient, cache: LocalCache) -> Self {
        let transcript = cache.load().unwrap_or_else(|| vec![ChatTurn::assistant(GREETING)]);
        debug!(turns = transcript.len(), "mounting controller");
        let mut controller = Self {
            adapter,
            persistence,
            cache,
            transcript,
            session: None,
            session_state: SessionState::InitializationFailed,
            phase: Phase::Idle,
            error: None,
            pending_saves: Vec::new(),
        };

        match controller.adapter.start_session(Some(controller.transcript.as_slice())) {
            Ok(session) => {
                controller.session = Some(session);
                controller.session_state = SessionState::Initialized;
            }
            Err(err) => {
                error!(error = %err, "failed to initialize chat");
                controller.error = Some(format!("Failed to initialize chat: {}", err.message()));
                controller.push_turn(ChatTurn::assistant(format!(
                    "Error: Failed to initialize. Please check your API key setup. Details: {}",
                    err.message()
                )));
            }
        }
        controller
    }

    /// Returns the conversation so far, greeting first.
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true while a reply is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }

    /// Returns the outcome of the last session start.
    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    /// Returns the current error flag, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the model of the configured adapter.
    pub fn model(&self) -> &str {
        self.adapter.model()
    }

    /// Returns the most recent summary turn.
    pub fn last_summary(&self) -> Option<&ChatTurn> {
        self.transcript.iter().rev().find(|turn| is_summary(turn))
    }

    /// Returns the number of detached saves not yet awaited.
    pub fn pending_saves(&self) -> usize {
        self.pending_saves.len()
    }

    /// Sends `text` and appends the reply, or an error turn, to the transcript.
    ///
    /// Blank input and input that arrives while a reply is outstanding are
    /// ignored; the return value says whether the message was taken.
    pub async fn send_message(&mut self, text: &str) -> bool {
        let Some(text) = self.begin_send(text) else {
            return false;
        };

        let reply = match self.session.as_mut() {
            None => {
                self.error = Some(NOT_INITIALIZED.to_string());
                format!("Sorry, I encountered an error: {NOT_INITIALIZED}")
            }
            Some(session) => {
                let reply = self.adapter.send(session, &text).await;
                if reply.failed {
                    self.error = Some(reply.text.clone());
                }
                reply.text
            }
        };

        self.push_turn(ChatTurn::assistant(reply));
        self.phase = Phase::Idle;
        true
    }

    /// Saves the current conversation in the background and starts over.
    ///
    /// The caller is responsible for confirming with the user first. The save
    /// is detached: this returns as soon as the transcript is reset, whether
    /// or not the save ever finishes. Returns true if a save was started.
    pub fn new_chat(&mut self) -> bool {
        self.pending_saves.retain(|handle| !handle.is_finished());

        let saving = self.transcript.len() > 1;
        if saving {
            let persistence = self.persistence.clone();
            let transcript = self.transcript.clone();
            self.pending_saves.push(tokio::spawn(async move {
                persistence.save_transcript(&transcript).await
            }));
        }

        self.transcript = vec![ChatTurn::assistant(GREETING)];
        self.cache.store(&self.transcript);

        match self.adapter.start_session(None) {
            Ok(session) => {
                self.session = Some(session);
                self.session_state = SessionState::Initialized;
                self.error = None;
            }
            Err(err) => {
                error!(error = %err, "failed to start new chat");
                self.session = None;
                self.session_state = SessionState::InitializationFailed;
                self.error = Some(format!("Failed to start new chat: {}", err.message()));
            }
        }
        saving
    }

    /// Waits for every detached save to finish.
    ///
    /// Outcomes have already been reported through the notifier; this only
    /// keeps the process alive long enough for them to happen.
    pub async fn flush_saves(&mut self) {
        for handle in self.pending_saves.drain(..) {
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => debug!(error = %err, "detached save failed"),
                Err(err) => warn!(error = %err, "detached save did not complete"),
            }
        }
    }

    fn begin_send(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.phase == Phase::AwaitingResponse {
            return None;
        }
        self.push_turn(ChatTurn::user(text));
        self.phase = Phase::AwaitingResponse;
        self.error = None;
        Some(text.to_string())
    }

    fn push_turn(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
        self.cache.store(&self.transcript);
    }
}
