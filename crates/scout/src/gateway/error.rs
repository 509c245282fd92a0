//! Gateway error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the tool gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or the handshake failed.
    #[error("gateway unavailable at {endpoint}: {message}")]
    Unavailable { endpoint: String, message: String },

    /// An operation exceeded its time budget.
    #[error("gateway {operation} timed out after {}s", .timeout.as_secs_f32())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The session was closed, locally or by the gateway.
    #[error("gateway session is closed")]
    Closed,

    /// The gateway answered with a JSON-RPC error.
    #[error("gateway error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A tool ran and reported failure.
    #[error("tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },

    /// The gateway sent something we could not interpret.
    #[error("gateway protocol error: {0}")]
    Protocol(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn unavailable(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Unavailable {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
