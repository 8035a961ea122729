//! The Tech Request Assistant chat application.
//!
//! # Architecture
//!
//! - [`adapter`]: sessions on top of a [`ChatProvider`]
//! - [`controller`]: transcript, session and background saves
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`prompt`]: greeting and system instruction

pub mod adapter;
pub mod commands;
pub mod config;
pub mod controller;
pub mod prompt;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use adapter::{ChatAdapter, ChatProvider, ChatSession, SEND_FAILURE_PREFIX, SendReply};
pub use commands::{ChatCommand, help_text, is_confirmation, parse_command};
pub use config::{AssistantConfig, ChatArgs};
pub use controller::{Controller, Phase, SessionState};
pub use prompt::{DEFAULT_MODEL, GREETING, SYSTEM_PROMPT};
