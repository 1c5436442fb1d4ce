//! Agent Client Error Types
//!
//! Transport and request-validation errors for the streaming agent client.
//! The taxonomy is deliberately small: a request either failed before any
//! events were produced (`RequestFailed`), the transport broke (`Network`),
//! the request body could not be built (`Parse`), or local validation
//! rejected it before it was sent (`InvalidRequest`). Malformed stream frames
//! are never errors — the decoder skips them.

use thiserror::Error;

/// Error type for the agent client layer.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The backend answered with a non-success status before any events
    /// were yielded. Carries the status and the raw body text.
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Network/connection error, at construction or mid-stream
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request body serialization error
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Local validation rejected the request before it was sent
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type alias for agent client errors
pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    /// Create a network error from anything displayable
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }
}
