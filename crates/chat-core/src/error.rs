//! Error types for chat operations.

use thiserror::Error;

/// Errors that can occur when talking to the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing, invalid or expired token. Handled at session level.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-2xx response. The body is the raw response text.
    #[error("request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    /// The request could not complete (offline, refused, timed out).
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response whose body does not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A draft with no text and no attachments.
    #[error("message has no text and no attachments")]
    EmptyMessage,

    /// An outgoing file that cannot be encoded into the upload.
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),

    /// An operation that needs an active thread was called without one.
    #[error("no peer selected")]
    NoPeerSelected,

    /// IO error (e.g., reading an attachment file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Whether the next scheduled poll may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Request { .. } | ChatError::Network(_))
    }

    /// Whether the session has to be re-established.
    pub fn is_auth(&self) -> bool {
        matches!(self, ChatError::Auth(_))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}
