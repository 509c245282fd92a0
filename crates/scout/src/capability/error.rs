//! Capability error types.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur when building the registry or invoking a capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// No capability with this name is registered.
    #[error("capability not found: {0}")]
    NotFound(String),

    /// Arguments did not match what the capability expects.
    #[error("invalid arguments for '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    /// The capability ran and failed.
    #[error("capability '{name}' failed: {message}")]
    InvocationFailed { name: String, message: String },

    /// The capability did not answer within its budget.
    #[error("capability '{name}' timed out: {message}")]
    Timeout { name: String, message: String },

    /// Two capabilities share a name and the collision policy forbids it.
    #[error("capability name collision: {0}")]
    Collision(String),
}

impl CapabilityError {
    pub fn invalid_arguments(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn invocation_failed(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvocationFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Classify a gateway failure for the named remote capability.
    pub fn from_gateway(name: impl Into<String>, error: GatewayError) -> Self {
        let name = name.into();
        if error.is_timeout() {
            Self::Timeout {
                name,
                message: error.to_string(),
            }
        } else {
            Self::InvocationFailed {
                name,
                message: error.to_string(),
            }
        }
    }
}
