//! Common test utilities.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use scout::gateway::{GatewayConnection, GatewayConnector, GatewayError, SessionTimeouts};
use scout_gateway_protocol::{CallToolResult, ContentBlock, ToolInfo, error_codes};

/// How the mock gateway answers `tools/call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallBehavior {
    /// Echo the query back in a few sentences.
    Answer,
    /// Never answer.
    Hang,
}

/// Observed traffic, shared between the test and the mock.
#[derive(Debug, Default)]
pub struct Traffic {
    pub connects: AtomicUsize,
    pub calls: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Traffic {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// In-process gateway with a fixed tool list.
pub struct MockGateway {
    pub traffic: Arc<Traffic>,
    tools: Vec<String>,
    behavior: CallBehavior,
    fail_discovery: bool,
}

impl MockGateway {
    pub fn new(tools: &[&str], behavior: CallBehavior) -> Self {
        Self {
            traffic: Arc::new(Traffic::default()),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            behavior,
            fail_discovery: false,
        }
    }

    /// Answer `tools/list` with an RPC error.
    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }
}

#[async_trait]
impl GatewayConnector for MockGateway {
    async fn connect(&self, _endpoint: &str) -> Result<Box<dyn GatewayConnection>, GatewayError> {
        self.traffic.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            traffic: self.traffic.clone(),
            tools: self.tools.clone(),
            behavior: self.behavior,
            fail_discovery: self.fail_discovery,
        }))
    }
}

struct MockConnection {
    traffic: Arc<Traffic>,
    tools: Vec<String>,
    behavior: CallBehavior,
    fail_discovery: bool,
}

#[async_trait]
impl GatewayConnection for MockConnection {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>, GatewayError> {
        if self.fail_discovery {
            return Err(GatewayError::Rpc {
                code: error_codes::INTERNAL_ERROR,
                message: "tool index unavailable".to_string(),
            });
        }
        Ok(self
            .tools
            .iter()
            .map(|name| ToolInfo {
                name: name.clone(),
                description: Some(format!("Mock {name}")),
                input_schema: None,
            })
            .collect())
    }

    async fn call_tool(&self, _name: &str, arguments: Value) -> Result<CallToolResult, GatewayError> {
        self.traffic.calls.fetch_add(1, Ordering::SeqCst);
        if self.behavior == CallBehavior::Hang {
            futures::future::pending::<()>().await;
        }

        let query = arguments["query"].as_str().unwrap_or_default();
        Ok(CallToolResult {
            content: vec![ContentBlock::text(format!(
                "{query} is an active research field. Recent growth in funding is rising. \
                 Hardware remains the main challenge."
            ))],
            is_error: false,
        })
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.traffic.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Short budgets so timeout tests finish quickly.
pub fn fast_timeouts() -> SessionTimeouts {
    SessionTimeouts {
        connect: Duration::from_secs(2),
        discovery: Duration::from_secs(2),
        call: Duration::from_millis(100),
    }
}
