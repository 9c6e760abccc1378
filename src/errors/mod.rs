/// Structured error handling for the synchronization layer
///
/// Every failure path of the layer maps onto one of these variants:
/// - Transport: socket/handshake failure (stream reconnects, never surfaced to views)
/// - Parse: malformed stream frame (dropped, never surfaced to views)
/// - Request: request/response failure (shared by every broker waiter for the key)
/// - ExhaustedRetries: reconnect budget used up (observable only as `connected == false`)
///
/// The type is `Clone` because a single settled request result is handed to
/// every caller that collapsed onto it.
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request for '{resource}' failed{}: {message}", status_suffix(.status))]
    Request {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Reconnect attempts exhausted after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

impl SyncError {
    pub fn transport(message: impl Into<String>) -> Self {
        SyncError::Transport(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        SyncError::Parse(message.into())
    }

    pub fn request(resource: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        SyncError::Request {
            resource: resource.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Errors the layer recovers from on its own (retry or drop)
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Transport(_) => true,
            SyncError::Parse(_) => true,
            _ => false,
        }
    }

    /// Whether a caller may reasonably re-issue the same request
    ///
    /// Client errors (4xx) are not retried; everything else on the request
    /// path is.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Request { status: Some(code), .. } => !(400..500).contains(code),
            SyncError::Request { status: None, .. } => true,
            SyncError::Transport(_) => true,
            SyncError::Cancelled(_) => true,
            _ => false,
        }
    }

    /// HTTP status attached to a request failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(e: toml::de::Error) -> Self {
        SyncError::Config(e.to_string())
    }
}
