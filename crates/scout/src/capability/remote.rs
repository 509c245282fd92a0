//! Capabilities discovered on the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::error::CapabilityError;
use super::{Capability, CapabilityDescriptor, CapabilityOrigin, SharedCapability};
use crate::gateway::{GatewayError, GatewaySession};

/// A gateway tool invoked through the session that discovered it.
pub struct RemoteCapability {
    session: Arc<GatewaySession>,
    tool: String,
}

impl RemoteCapability {
    pub fn new(session: Arc<GatewaySession>, tool: impl Into<String>) -> Self {
        Self {
            session,
            tool: tool.into(),
        }
    }
}

#[async_trait]
impl Capability for RemoteCapability {
    async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError> {
        self.session
            .invoke(&self.tool, arguments)
            .await
            .map_err(|e| CapabilityError::from_gateway(&self.tool, e))
    }
}

/// Discover the gateway's tools and wrap each as a remote capability.
pub async fn remote_capabilities(
    session: &Arc<GatewaySession>,
) -> Result<Vec<CapabilityDescriptor>, GatewayError> {
    let tools = session.discover_capabilities().await?;

    Ok(tools
        .into_iter()
        .map(|tool| {
            let capability: SharedCapability =
                Arc::new(RemoteCapability::new(session.clone(), &tool.name));
            CapabilityDescriptor::new(
                tool.name,
                CapabilityOrigin::Remote,
                tool.description.unwrap_or_default(),
                capability,
            )
        })
        .collect())
}

/// Remote capabilities for an optional session.
///
/// A discovery failure is returned only when the gateway is `required`.
/// Otherwise it is logged and the run continues with no remote capabilities.
pub async fn optional_remote_capabilities(
    session: Option<&Arc<GatewaySession>>,
    required: bool,
) -> Result<Vec<CapabilityDescriptor>, GatewayError> {
    let Some(session) = session else {
        return Ok(Vec::new());
    };

    match remote_capabilities(session).await {
        Ok(capabilities) => Ok(capabilities),
        Err(e) if !required => {
            warn!(error = %e, "Gateway discovery failed, continuing with local capabilities");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}
