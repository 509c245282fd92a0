//! Pipeline error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::capability::CapabilityError;
use crate::store::StorageError;

/// Failure category reported by a FAILED run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Raised before a run starts, while the gateway session is set up.
    GatewayUnavailable,
    CapabilityNotFound,
    CapabilityInvocationFailure,
    PersistenceFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::GatewayUnavailable => "gateway_unavailable",
            ErrorKind::CapabilityNotFound => "capability_not_found",
            ErrorKind::CapabilityInvocationFailure => "capability_invocation_failure",
            ErrorKind::PersistenceFailure => "persistence_failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Capability(CapabilityError::NotFound(_)) => {
                ErrorKind::CapabilityNotFound
            }
            PipelineError::Capability(_) => ErrorKind::CapabilityInvocationFailure,
            PipelineError::Storage(_) => ErrorKind::PersistenceFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_source() {
        let not_found = PipelineError::from(CapabilityError::NotFound("search".into()));
        assert_eq!(not_found.kind(), ErrorKind::CapabilityNotFound);

        let timeout = PipelineError::from(CapabilityError::Timeout {
            name: "search".into(),
            message: "60s".into(),
        });
        assert_eq!(timeout.kind(), ErrorKind::CapabilityInvocationFailure);

        let storage = PipelineError::from(StorageError::serialization("bad"));
        assert_eq!(storage.kind(), ErrorKind::PersistenceFailure);
        assert_eq!(storage.kind().to_string(), "persistence_failure");
    }
}
