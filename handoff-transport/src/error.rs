// ABOUTME: Error taxonomy for service calls and the push channel.
// ABOUTME: Every variant is recoverable; callers decide how to surface it.

use thiserror::Error;

/// Errors raised by the chat service transport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Request could not be sent or the connection failed mid-flight
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built (bad MIME string, bad URL segment)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Push channel closed or could not be opened
    #[error("push channel dropped: {0}")]
    ChannelDropped(String),

    /// A single push frame could not be parsed; the channel itself is fine
    #[error("malformed push payload: {0}")]
    MalformedPushPayload(String),
}

impl TransportError {
    /// True for errors that leave the push channel usable
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, TransportError::MalformedPushPayload(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
