//! Gateway session lifecycle.
//!
//! A session moves `Closed -> Connecting -> Open -> Closed`, or ends in
//! `Failed` when the connection could not be established or released
//! cleanly. [`with_session`] scopes a session to a closure and guarantees
//! release on every exit path, panics included.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use scout_gateway_protocol::ToolInfo;

use super::error::GatewayError;
use super::transport::{GatewayConnection, GatewayConnector};
use crate::config::GatewayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Closed = 0,
    Connecting = 1,
    Open = 2,
    Failed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Connecting,
            2 => SessionState::Open,
            3 => SessionState::Failed,
            _ => SessionState::Closed,
        }
    }
}

/// Time budgets for gateway operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub connect: Duration,
    pub discovery: Duration,
    pub call: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self::from(&GatewayConfig::default())
    }
}

impl From<&GatewayConfig> for SessionTimeouts {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            discovery: config.discovery_timeout(),
            call: config.call_timeout(),
        }
    }
}

/// A connection to the tool gateway and its lifecycle state.
pub struct GatewaySession {
    endpoint: String,
    connection: OnceLock<Box<dyn GatewayConnection>>,
    timeouts: SessionTimeouts,
    state: AtomicU8,
}

impl GatewaySession {
    /// A session for `endpoint` that has not connected yet.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeouts: SessionTimeouts) -> Self {
        Self {
            endpoint: endpoint.into(),
            connection: OnceLock::new(),
            timeouts,
            state: AtomicU8::new(SessionState::Closed as u8),
        }
    }

    /// Create a session for `endpoint` and connect it.
    pub async fn open(
        connector: &dyn GatewayConnector,
        endpoint: &str,
        timeouts: SessionTimeouts,
    ) -> Result<Self, GatewayError> {
        let session = Self::new(endpoint, timeouts);
        session.connect(connector).await?;
        Ok(session)
    }

    /// Establish the connection. A session connects at most once.
    ///
    /// The state is `Connecting` until the transport answers. Any failure,
    /// including an expired connect budget, is reported as
    /// [`GatewayError::Unavailable`] and leaves the session `Failed`. A
    /// session closed while connecting releases the new connection and
    /// reports [`GatewayError::Closed`].
    pub async fn connect(&self, connector: &dyn GatewayConnector) -> Result<(), GatewayError> {
        let fresh = self.connection.get().is_none();
        if !fresh || !self.transition(SessionState::Closed, SessionState::Connecting) {
            return Err(GatewayError::protocol(format!(
                "session for {} cannot connect from state {:?}",
                self.endpoint,
                self.state()
            )));
        }

        let endpoint = self.endpoint.as_str();
        debug!(endpoint, state = ?SessionState::Connecting, "Opening gateway session");

        let connection = match tokio::time::timeout(self.timeouts.connect, connector.connect(endpoint))
            .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(self.fail_connect(e)),
            Err(_) => {
                return Err(self.fail_connect(GatewayError::unavailable(
                    endpoint,
                    format!("connect timed out after {}s", self.timeouts.connect.as_secs()),
                )));
            }
        };

        if let Err(connection) = self.connection.set(connection) {
            let _ = connection.close().await;
            return Err(GatewayError::protocol("session connected twice"));
        }

        if !self.transition(SessionState::Connecting, SessionState::Open) {
            debug!(endpoint, "Gateway session closed while connecting");
            if let Some(connection) = self.connection.get() {
                connection.close().await?;
            }
            return Err(GatewayError::Closed);
        }

        info!(endpoint, "Gateway session open");
        Ok(())
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn fail_connect(&self, error: GatewayError) -> GatewayError {
        // A concurrent close wins over the failure.
        self.transition(SessionState::Connecting, SessionState::Failed);
        match error {
            GatewayError::Unavailable { .. } => error,
            other => GatewayError::unavailable(&self.endpoint, other),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn connection(&self) -> Result<&dyn GatewayConnection, GatewayError> {
        match (self.state(), self.connection.get()) {
            (SessionState::Open, Some(connection)) => Ok(connection.as_ref()),
            _ => Err(GatewayError::Closed),
        }
    }

    /// List the tools the gateway offers.
    ///
    /// An empty list is not an error.
    pub async fn discover_capabilities(&self) -> Result<Vec<ToolInfo>, GatewayError> {
        let connection = self.connection()?;

        let tools = tokio::time::timeout(self.timeouts.discovery, connection.list_tools())
            .await
            .map_err(|_| GatewayError::Timeout {
                operation: "discovery",
                timeout: self.timeouts.discovery,
            })??;

        if tools.is_empty() {
            warn!(endpoint = %self.endpoint, "Gateway offers no capabilities");
        } else {
            info!(endpoint = %self.endpoint, count = tools.len(), "Discovered gateway capabilities");
        }

        Ok(tools)
    }

    /// Call a gateway tool and return its text output.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<String, GatewayError> {
        let connection = self.connection()?;

        let result =
            tokio::time::timeout(self.timeouts.call, connection.call_tool(name, arguments))
                .await
                .map_err(|_| GatewayError::Timeout {
                    operation: "call",
                    timeout: self.timeouts.call,
                })??;

        let text = result.text();
        if result.is_error {
            return Err(GatewayError::ToolFailed {
                name: name.to_string(),
                message: text,
            });
        }
        Ok(text)
    }

    /// Release the connection. Only the first call reaches the transport.
    pub async fn close(&self) -> Result<(), GatewayError> {
        let previous = self
            .state
            .swap(SessionState::Closed as u8, Ordering::AcqRel);
        if SessionState::from_u8(previous) != SessionState::Open {
            return Ok(());
        }
        let Some(connection) = self.connection.get() else {
            return Ok(());
        };

        match connection.close().await {
            Ok(()) => {
                info!(endpoint = %self.endpoint, "Gateway session closed");
                Ok(())
            }
            Err(e) => {
                self.state
                    .store(SessionState::Failed as u8, Ordering::Release);
                Err(e)
            }
        }
    }
}

/// Open a session, run `f` with it, and close it on every exit path.
///
/// A panic inside `f` is resumed after the session is closed.
pub async fn with_session<F, Fut, T>(
    connector: &dyn GatewayConnector,
    endpoint: &str,
    timeouts: SessionTimeouts,
    f: F,
) -> Result<T, GatewayError>
where
    F: FnOnce(Arc<GatewaySession>) -> Fut,
    Fut: Future<Output = T>,
{
    let session = Arc::new(GatewaySession::open(connector, endpoint, timeouts).await?);
    Ok(run_scoped(session.clone(), f(session)).await)
}

/// Like [`with_session`], for gateways that may be absent or optional.
///
/// With no endpoint, or when an optional gateway is unreachable, `f` runs
/// with `None`. An unreachable required gateway is an error.
pub async fn with_optional_session<F, Fut, T>(
    connector: &dyn GatewayConnector,
    endpoint: Option<&str>,
    required: bool,
    timeouts: SessionTimeouts,
    f: F,
) -> Result<T, GatewayError>
where
    F: FnOnce(Option<Arc<GatewaySession>>) -> Fut,
    Fut: Future<Output = T>,
{
    let Some(endpoint) = endpoint else {
        debug!("No gateway configured, using local capabilities only");
        return Ok(f(None).await);
    };

    match GatewaySession::open(connector, endpoint, timeouts).await {
        Ok(session) => {
            let session = Arc::new(session);
            Ok(run_scoped(session.clone(), f(Some(session))).await)
        }
        Err(e) if !required => {
            warn!(error = %e, "Optional gateway unavailable, continuing with local capabilities");
            Ok(f(None).await)
        }
        Err(e) => Err(e),
    }
}

async fn run_scoped<Fut, T>(session: Arc<GatewaySession>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let outcome = AssertUnwindSafe(fut).catch_unwind().await;

    if let Err(e) = session.close().await {
        warn!(endpoint = %session.endpoint(), error = %e, "Failed to close gateway session");
    }

    match outcome {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
