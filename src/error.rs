//! Error types for the Tech Request Assistant.
//!
//! Every failure the assistant can hit falls into one of five kinds. The
//! split mirrors how each kind is surfaced: initialization and send failures
//! become visible transcript turns, save failures become notifications, and
//! storage failures are only logged.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The main error type for the assistant.
#[derive(Clone, Debug)]
pub enum Error {
    /// The chat session could not be created.
    ///
    /// Missing credentials and HTTP client construction failures land here.
    Initialization {
        /// Human-readable error message.
        message: String,
    },

    /// A message exchange with the model failed.
    Send {
        /// Human-readable error message.
        message: String,
        /// HTTP status code returned by the provider, if any.
        status_code: Option<u16>,
    },

    /// The persistence endpoint rejected a save with a client-class status.
    ///
    /// These are never retried.
    SaveClient {
        /// HTTP status code.
        status_code: u16,
        /// Message parsed from the response body, or the status reason.
        message: String,
    },

    /// The persistence endpoint failed with a server-class status or could not
    /// be reached at all.
    SaveServer {
        /// HTTP status code; `None` for network-level failures.
        status_code: Option<u16>,
        /// Human-readable error message.
        message: String,
    },

    /// Reading or writing the local transcript cache failed.
    Storage {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new initialization error.
    pub fn initialization(message: impl Into<String>) -> Self {
        Error::Initialization {
            message: message.into(),
        }
    }

    /// Creates a new send error.
    pub fn send(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Error::Send {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new non-retryable save error.
    pub fn save_client(status_code: u16, message: impl Into<String>) -> Self {
        Error::SaveClient {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new retryable save error.
    pub fn save_server(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Error::SaveServer {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    pub fn storage(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Storage {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Returns true if this error happened while creating a session.
    pub fn is_initialization(&self) -> bool {
        matches!(self, Error::Initialization { .. })
    }

    /// Returns true if this error happened during a message exchange.
    pub fn is_send(&self) -> bool {
        matches!(self, Error::Send { .. })
    }

    /// Returns true if this is a client-class save failure.
    pub fn is_save_client(&self) -> bool {
        matches!(self, Error::SaveClient { .. })
    }

    /// Returns true if this is a server-class or network save failure.
    pub fn is_save_server(&self) -> bool {
        matches!(self, Error::SaveServer { .. })
    }

    /// Returns true if this error came from the local cache.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    /// Returns true if the operation that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::SaveServer { .. })
    }

    /// Returns the bare message without the kind prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Error::Initialization { message }
            | Error::Send { message, .. }
            | Error::SaveClient { message, .. }
            | Error::SaveServer { message, .. }
            | Error::Storage { message, .. } => message,
        }
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Send { status_code, .. } => *status_code,
            Error::SaveClient { status_code, .. } => Some(*status_code),
            Error::SaveServer { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization { message } => {
                write!(f, "Initialization error: {message}")
            }
            Error::Send {
                message,
                status_code,
            } => {
                if let Some(status_code) = status_code {
                    write!(f, "Send error: {message} (status {status_code})")
                } else {
                    write!(f, "Send error: {message}")
                }
            }
            Error::SaveClient {
                status_code,
                message,
            } => {
                write!(f, "Save rejected ({status_code}): {message}")
            }
            Error::SaveServer {
                status_code,
                message,
            } => {
                if let Some(status_code) = status_code {
                    write!(f, "Save failed ({status_code}): {message}")
                } else {
                    write!(f, "Save failed: {message}")
                }
            }
            Error::Storage { message, .. } => {
                write!(f, "Storage error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Storage { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::storage(err.to_string(), Some(Box::new(err)))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::storage(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for assistant operations.
pub type Result<T> = std::result::Result<T, Error>;
