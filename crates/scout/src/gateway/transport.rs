//! Transport seam between a session and the wire.

use async_trait::async_trait;
use serde_json::Value;

use scout_gateway_protocol::{CallToolResult, ToolInfo};

use super::error::GatewayError;

/// Opens connections to a gateway endpoint.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn GatewayConnection>, GatewayError>;
}

/// An established gateway connection.
///
/// Sessions guarantee `close` is called at most once.
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>, GatewayError>;

    async fn call_tool(&self, name: &str, arguments: Value)
    -> Result<CallToolResult, GatewayError>;

    async fn close(&self) -> Result<(), GatewayError>;
}
