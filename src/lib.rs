// Public modules
pub mod cache;
pub mod chat;
pub mod client;
pub mod error;
pub mod format;
pub mod notify;
pub mod observability;
pub mod persistence;
pub mod render;
pub mod types;
pub mod utils;

// Re-exports
pub use cache::LocalCache;
pub use client::GeminiClient;
pub use error::{Error, Result};
pub use notify::{Notification, NotificationLevel, NotificationQueue, Notifier};
pub use observability::{metrics_snapshot, register_biometrics};
pub use persistence::{HttpTransport, PersistenceClient, SaveTransport};
pub use types::*;
