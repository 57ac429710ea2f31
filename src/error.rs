//! Error types for the conversation client

use thiserror::Error;

/// Errors from a chat-messages round trip
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (DNS, connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status. Displays exactly the message the service sent,
    /// or the generic fallback when it sent none.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Success status with a body we could not decode
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ClientError {
    /// Build a `Request` error, falling back to the generic HTTP message
    pub fn request(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        Self::Request { status, message }
    }

    /// HTTP status for `Request` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
