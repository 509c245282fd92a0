//! JSON-RPC over server-sent events.
//!
//! The client holds a `GET` stream open for the lifetime of the connection.
//! The first `endpoint` event names the URL requests are POSTed to; each
//! response comes back as a `message` event carrying the request id. A
//! spawned reader task routes responses to waiting callers.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use scout_gateway_protocol::{
    CallToolParams, CallToolResult, InitializeParams, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ToolInfo, events, methods,
};

use super::error::GatewayError;
use super::transport::{GatewayConnection, GatewayConnector};
use crate::build_info;
use crate::sse_parser::SseEventStream;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;
type PendingMap = DashMap<u64, oneshot::Sender<JsonRpcResponse>>;

/// Connector for gateways that speak JSON-RPC over SSE.
#[derive(Clone, Default)]
pub struct SseConnector {
    client: Client,
}

impl SseConnector {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayConnector for SseConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn GatewayConnection>, GatewayError> {
        let base = Url::parse(endpoint).map_err(|e| GatewayError::unavailable(endpoint, e))?;

        let response = self
            .client
            .get(base.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| GatewayError::unavailable(endpoint, e))?;

        if !response.status().is_success() {
            return Err(GatewayError::unavailable(
                endpoint,
                format!("stream request returned status {}", response.status()),
            ));
        }

        let bytes: ByteStream = Box::pin(response.bytes_stream());
        let mut stream = SseEventStream::new(bytes);

        let post_url = loop {
            match stream.next().await {
                Some(Ok(event)) if event.event == events::ENDPOINT => {
                    break base
                        .join(event.data.trim())
                        .map_err(|e| GatewayError::unavailable(endpoint, e))?;
                }
                Some(Ok(event)) => {
                    debug!(event = %event.event, "Ignoring gateway event before endpoint");
                }
                Some(Err(e)) => return Err(GatewayError::unavailable(endpoint, e)),
                None => {
                    return Err(GatewayError::unavailable(
                        endpoint,
                        "stream ended before endpoint event",
                    ));
                }
            }
        };

        debug!(post_url = %post_url, "Gateway message endpoint received");

        let pending = Arc::new(PendingMap::new());
        let stream_open = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(route_responses(stream, pending.clone(), stream_open.clone()));

        let connection = SseConnection {
            client: self.client.clone(),
            post_url,
            pending,
            stream_open,
            next_id: AtomicU64::new(1),
            reader,
        };

        connection
            .initialize()
            .await
            .map_err(|e| GatewayError::unavailable(endpoint, e))?;

        Ok(Box::new(connection))
    }
}

/// Deliver `message` events to the callers waiting on their ids.
///
/// When the stream ends `stream_open` is cleared and every outstanding
/// caller is woken with a closed channel.
async fn route_responses(
    mut stream: SseEventStream<ByteStream>,
    pending: Arc<PendingMap>,
    stream_open: Arc<AtomicBool>,
) {
    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Gateway stream failed");
                break;
            }
        };

        if event.event != events::MESSAGE {
            debug!(event = %event.event, "Ignoring gateway event");
            continue;
        }

        let response: JsonRpcResponse = match serde_json::from_str(&event.data) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Ignoring undecodable gateway message");
                continue;
            }
        };

        // Server-initiated requests and notifications carry neither field.
        if response.result.is_none() && response.error.is_none() {
            continue;
        }

        let Some(id) = response.id else {
            continue;
        };

        match pending.remove(&id) {
            Some((_, tx)) => {
                let _ = tx.send(response);
            }
            None => debug!(id, "No caller waiting for gateway response"),
        }
    }

    debug!("Gateway stream ended");
    // Cleared before draining so a request registered afterwards sees it.
    stream_open.store(false, Ordering::SeqCst);
    pending.clear();
}

/// Removes a pending entry when its caller finishes or gives up.
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

struct SseConnection {
    client: Client,
    post_url: Url,
    pending: Arc<PendingMap>,
    stream_open: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl SseConnection {
    async fn initialize(&self) -> Result<(), GatewayError> {
        let params = InitializeParams::new(build_info::CLIENT_NAME, build_info::VERSION);
        let params =
            serde_json::to_value(params).map_err(|e| GatewayError::protocol(e.to_string()))?;

        let result = self.request(methods::INITIALIZE, Some(params)).await?;
        debug!(
            server = %result.pointer("/serverInfo/name").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            "Gateway initialized"
        );

        self.post(&JsonRpcNotification::new(methods::INITIALIZED))
            .await
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };
        // No response can arrive once the stream is gone.
        if !self.stream_open.load(Ordering::SeqCst) {
            return Err(GatewayError::Closed);
        }

        self.post(&JsonRpcRequest::new(id, method, params)).await?;

        let response = rx.await.map_err(|_| GatewayError::Closed)?;
        if let Some(error) = response.error {
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn post<T: Serialize + Sync>(&self, body: &T) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.post_url.clone())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::protocol(format!(
                "message rejected with status {status}: {message}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl GatewayConnection for SseConnection {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>, GatewayError> {
        let result = self.request(methods::TOOLS_LIST, None).await?;
        let listed: ListToolsResult =
            serde_json::from_value(result).map_err(|e| GatewayError::protocol(e.to_string()))?;

        if listed.next_cursor.is_some() {
            debug!("Gateway tool list is paginated; only the first page is used");
        }
        Ok(listed.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, GatewayError> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let params =
            serde_json::to_value(params).map_err(|e| GatewayError::protocol(e.to_string()))?;

        let result = self.request(methods::TOOLS_CALL, Some(params)).await?;
        serde_json::from_value(result).map_err(|e| GatewayError::protocol(e.to_string()))
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.stream_open.store(false, Ordering::SeqCst);
        self.reader.abort();
        self.pending.clear();
        Ok(())
    }
}

impl Drop for SseConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
