//! Capabilities: named, invocable operations from the gateway or defined
//! locally, addressed uniformly through a registry.

pub mod error;
pub mod local;
pub mod registry;
pub mod remote;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use error::CapabilityError;
pub use local::{SaveDefinition, SaveFile, SimpleSearch, local_capabilities};
pub use registry::{CapabilityRegistry, CollisionPolicy};
pub use remote::{RemoteCapability, optional_remote_capabilities, remote_capabilities};

/// An operation that can be invoked with JSON arguments and yields text.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError>;
}

/// Type alias for a shared capability reference.
pub type SharedCapability = Arc<dyn Capability>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityOrigin {
    Remote,
    Local,
}

impl fmt::Display for CapabilityOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityOrigin::Remote => f.write_str("remote"),
            CapabilityOrigin::Local => f.write_str("local"),
        }
    }
}

/// A registry entry: name, where it came from, and how to call it.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub origin: CapabilityOrigin,
    pub description: String,
    capability: SharedCapability,
}

impl CapabilityDescriptor {
    pub fn new(
        name: impl Into<String>,
        origin: CapabilityOrigin,
        description: impl Into<String>,
        capability: SharedCapability,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            description: description.into(),
            capability,
        }
    }

    pub async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError> {
        self.capability.invoke(arguments).await
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Extract a required string argument.
pub(crate) fn required_str<'a>(
    capability: &str,
    arguments: &'a Value,
    key: &str,
) -> Result<&'a str, CapabilityError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CapabilityError::invalid_arguments(capability, format!("missing string field '{key}'"))
        })
}
