//! Chat model error types.

use thiserror::Error;

/// Errors that can occur when calling a chat model backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response carried no message content
    #[error("model returned an empty response")]
    EmptyResponse,
}
