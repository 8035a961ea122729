//! Interactive Tech Request Assistant.
//!
//! Walks the user through describing a project and produces a requirements
//! summary. Conversations are cached locally between runs and saved to the
//! persistence service when a new chat is started.
//!
//! # Usage
//!
//! ```bash
//! # Uses API_KEY (or GEMINI_API_KEY) and BACKEND_URL from the environment
//! techreq-chat
//!
//! # Point at another persistence service and cache directory
//! techreq-chat --backend-url http://localhost:4000 --cache-dir /tmp/techreq
//!
//! # Disable colors (useful for piping output)
//! techreq-chat --no-color
//! ```
//!
//! # Commands
//!
//! - `/new` - Save this chat and start a new one
//! - `/copy` - Copy the latest summary to the clipboard
//! - `/history` - Show the conversation so far
//! - `/status` - Show model, backend, cache details and metrics
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use biometrics::Collector;
use rustyline::error::ReadlineError;
use rustyline::{Cmd, DefaultEditor, KeyCode, KeyEvent, Modifiers};
use tracing_subscriber::EnvFilter;

use techreq::chat::{
    AssistantConfig, ChatAdapter, ChatArgs, ChatCommand, Controller, PlainTextRenderer, Renderer,
    SYSTEM_PROMPT, help_text, is_confirmation, parse_command,
};
use techreq::notify::NotificationReceiver;
use techreq::{GeminiClient, LocalCache, NotificationQueue, PersistenceClient};

const NEW_CHAT_PROMPT: &str =
    "Are you sure you want to start a new chat? Your current conversation will be lost. [y/N] ";

/// Main entry point for the techreq-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("techreq=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let collector = Collector::new();
    techreq::register_biometrics(&collector);

    let (args, _) = ChatArgs::from_command_line_relaxed("techreq-chat [OPTIONS]");
    let config = AssistantConfig::from_env(args);

    let (queue, mut notifications) = NotificationQueue::new();
    let provider = GeminiClient::new(config.api_key.clone())?;
    let adapter = ChatAdapter::new(Arc::new(provider), config.model.clone(), SYSTEM_PROMPT);
    let persistence = PersistenceClient::new(&config.backend_url)?.with_notifier(Arc::new(queue));
    let cache = LocalCache::new(config.cache_dir.clone());

    let mut controller = Controller::mount(adapter, persistence, cache);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;
    rl.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::SHIFT), Cmd::Newline);
    rl.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::Newline);

    renderer.print_banner();
    for turn in controller.transcript() {
        renderer.print_turn(turn);
    }
    if let Some(error) = controller.error() {
        renderer.print_error(error);
    }

    loop {
        drain_notifications(&mut notifications, &mut renderer);

        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        if let Some(cmd) = parse_command(&line) {
            match cmd {
                ChatCommand::Quit => break,
                ChatCommand::New => {
                    let confirmed = match rl.readline(NEW_CHAT_PROMPT) {
                        Ok(answer) => is_confirmation(&answer),
                        Err(_) => false,
                    };
                    if !confirmed {
                        renderer.print_info("Keeping the current conversation.");
                        continue;
                    }
                    if controller.new_chat() {
                        renderer.print_info("Saving the previous conversation in the background.");
                    }
                    match controller.error() {
                        Some(error) => renderer.print_error(error),
                        None => {
                            for turn in controller.transcript() {
                                renderer.print_turn(turn);
                            }
                        }
                    }
                }
                ChatCommand::Copy => match controller.last_summary() {
                    Some(summary) => match copy_to_clipboard(summary.text()) {
                        Ok(()) => renderer.print_info("Summary copied to the clipboard."),
                        Err(err) => {
                            renderer.print_error(&format!("Failed to copy to the clipboard: {err}"))
                        }
                    },
                    None => renderer.print_error("There is no summary to copy yet."),
                },
                ChatCommand::History => {
                    for turn in controller.transcript() {
                        renderer.print_turn(turn);
                    }
                }
                ChatCommand::Status => print_status(&controller, &config, &collector),
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        println!("    {}", line);
                    }
                }
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        renderer.print_loading();
        if controller.send_message(&line).await {
            if let Some(reply) = controller.transcript().last() {
                renderer.print_turn(reply);
            }
        } else {
            renderer.finish_loading();
        }
    }

    if controller.pending_saves() > 0 {
        renderer.print_info("Waiting for the chat history to be saved...");
    }
    controller.flush_saves().await;
    drain_notifications(&mut notifications, &mut renderer);
    println!("Goodbye!");

    Ok(())
}

fn drain_notifications(notifications: &mut NotificationReceiver, renderer: &mut PlainTextRenderer) {
    for notification in notifications.drain() {
        renderer.print_notification(&notification);
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}

fn print_status(controller: &Controller, config: &AssistantConfig, collector: &Collector) {
    println!("    Session Status:");
    println!("      Model: {}", controller.model());
    println!("      Session: {:?}", controller.session_state());
    println!("      Turns: {}", controller.transcript().len());
    println!("      Backend: {}", config.backend_url);
    println!("      Cache: {}", config.cache_dir.display());
    println!("      Pending saves: {}", controller.pending_saves());
    match controller.error() {
        Some(error) => println!("      Last error: {}", error),
        None => println!("      Last error: (none)"),
    }
    println!("    Metrics:");
    for line in techreq::metrics_snapshot(collector) {
        println!("      {}", line);
    }
}
