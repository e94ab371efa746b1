//! JSON-RPC 2.0 protocol layer
//!
//! Implements JSON-RPC 2.0 over the LSP framing codec with request/response
//! matching, notification logging, and default answers to the few requests a
//! language server sends to its client.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, trace, warn};

use crate::lsp::framing::LspCodec;

// ============================================================================
// JSON-RPC Types
// ============================================================================

/// JSON-RPC 2.0 request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

/// JSON-RPC 2.0 notification message (no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

const METHOD_NOT_FOUND: i32 = -32601;

// ============================================================================
// JSON-RPC Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JsonRpcError {
    #[error("JSON-RPC server error ({code}): {message}")]
    Server { code: i32, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),

    #[error("Request '{method}' timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    #[error("Connection closed before a response arrived")]
    ConnectionClosed,
}

// ============================================================================
// JSON-RPC Client
// ============================================================================

type PendingRequests = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Incoming message classified by shape
enum Inbound {
    Response(JsonRpcResponse),
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl Inbound {
    fn parse(message: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(message).ok()?;
        let has_method = value.get("method").is_some();
        let has_id = value.get("id").is_some_and(|id| !id.is_null());

        match (has_method, has_id) {
            (true, true) => serde_json::from_value(value).ok().map(Inbound::Request),
            (true, false) => serde_json::from_value(value).ok().map(Inbound::Notification),
            (false, true) => serde_json::from_value(value).ok().map(Inbound::Response),
            (false, false) => None,
        }
    }
}

/// JSON-RPC client with request/response correlation
pub struct JsonRpcClient {
    /// Channel for outbound messages (requests, notifications, replies)
    outbound_sender: mpsc::UnboundedSender<String>,

    request_id: AtomicU64,

    pending_requests: PendingRequests,

    /// Set once the inbound stream has ended
    closed: Arc<AtomicBool>,

    request_timeout: Duration,
}

impl JsonRpcClient {
    /// Create a client speaking over `reader`/`writer`.
    ///
    /// Spawns one task writing framed outbound messages and one task reading
    /// framed inbound messages; both end when their stream closes.
    pub fn new<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<String>();
        let pending_requests: PendingRequests = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(async move {
            let mut sink = FramedWrite::new(writer, LspCodec::new());
            while let Some(message) = outbound_receiver.recv().await {
                trace!("JsonRpcClient: Sending message: {}", message);
                if let Err(e) = sink.send(message).await {
                    error!("Failed to send message: {}", e);
                    break;
                }
            }
            trace!("Outbound writer task finished");
        });

        let closed = Arc::new(AtomicBool::new(false));
        let closed_clone = Arc::clone(&closed);
        let pending_clone = Arc::clone(&pending_requests);
        let reply_sender = outbound_sender.clone();
        tokio::spawn(async move {
            let mut stream = FramedRead::new(reader, LspCodec::new());
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(message) => {
                        Self::process_inbound_message(&message, &pending_clone, &reply_sender)
                            .await
                    }
                    Err(e) => {
                        error!("Failed to receive message: {}", e);
                        break;
                    }
                }
            }
            // Wake every waiter; dropping the senders reports a closed connection
            closed_clone.store(true, Ordering::SeqCst);
            pending_clone.lock().await.clear();
            trace!("Inbound reader task finished");
        });

        Self {
            outbound_sender,
            request_id: AtomicU64::new(1),
            pending_requests,
            closed,
            request_timeout,
        }
    }

    async fn process_inbound_message(
        message: &str,
        pending_requests: &PendingRequests,
        reply_sender: &mpsc::UnboundedSender<String>,
    ) {
        trace!("JsonRpcClient: Received message: {}", message);

        match Inbound::parse(message) {
            Some(Inbound::Response(response)) => {
                let Some(id) = response.id.as_u64() else {
                    debug!("Received response with non-numeric id: {}", response.id);
                    return;
                };
                match pending_requests.lock().await.remove(&id) {
                    Some(sender) => {
                        if sender.send(response).is_err() {
                            debug!("Response receiver dropped for request {}", id);
                        }
                    }
                    None => debug!("Received response for unknown request {}", id),
                }
            }
            Some(Inbound::Request(request)) => {
                let reply = Self::default_reply(request);
                match serde_json::to_string(&reply) {
                    Ok(text) => {
                        if reply_sender.send(text).is_err() {
                            debug!("Outbound channel closed, dropping reply");
                        }
                    }
                    Err(e) => error!("Failed to serialize reply: {}", e),
                }
            }
            Some(Inbound::Notification(notification)) => {
                debug!(
                    method = %notification.method,
                    "Received notification"
                );
            }
            None => debug!("Received unparseable message: {}", message),
        }
    }

    /// Answer server-initiated requests: accept progress tokens and
    /// configuration pulls, refuse everything else
    fn default_reply(request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "window/workDoneProgress/create"
            | "client/registerCapability"
            | "client/unregisterCapability" => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(Value::Null),
                error: None,
            },
            "workspace/configuration" => {
                let items = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("items"))
                    .and_then(Value::as_array)
                    .map(|items| items.len())
                    .unwrap_or(0);
                JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: request.id,
                    result: Some(Value::Array(vec![Value::Null; items])),
                    error: None,
                }
            }
            method => {
                warn!("Refusing unsupported server request: {}", method);
                JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: request.id,
                    result: None,
                    error: Some(JsonRpcErrorObject {
                        code: METHOD_NOT_FOUND,
                        message: format!("Method not found: {}", method),
                        data: None,
                    }),
                }
            }
        }
    }

    /// Send a request and wait for its typed result using the default timeout
    pub async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R, JsonRpcError>
    where
        P: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        self.request_with_timeout(method, params, self.request_timeout)
            .await
    }

    pub async fn request_with_timeout<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        timeout: Duration,
    ) -> Result<R, JsonRpcError>
    where
        P: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let params = params
            .map(|p| serde_json::to_value(p).map_err(JsonRpcError::Serialization))
            .transpose()?;
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Value::from(id),
            method: method.to_string(),
            params,
        };
        let text = serde_json::to_string(&request).map_err(JsonRpcError::Serialization)?;

        let (sender, receiver) = oneshot::channel();
        self.pending_requests.lock().await.insert(id, sender);
        if self.closed.load(Ordering::SeqCst) {
            self.pending_requests.lock().await.remove(&id);
            return Err(JsonRpcError::ConnectionClosed);
        }

        if self.outbound_sender.send(text).is_err() {
            self.pending_requests.lock().await.remove(&id);
            return Err(JsonRpcError::Transport(
                "outbound channel closed".to_string(),
            ));
        }
        debug!("Sent request {} ({})", id, method);

        let response = match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(JsonRpcError::ConnectionClosed),
            Err(_) => {
                self.pending_requests.lock().await.remove(&id);
                return Err(JsonRpcError::Timeout {
                    method: method.to_string(),
                    timeout,
                });
            }
        };

        if let Some(error) = response.error {
            return Err(JsonRpcError::Server {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(JsonRpcError::Deserialization)
    }

    /// Send a notification (no response expected)
    pub fn notify<P: Serialize>(&self, method: &str, params: Option<P>) -> Result<(), JsonRpcError> {
        let params = params
            .map(|p| serde_json::to_value(p).map_err(JsonRpcError::Serialization))
            .transpose()?;
        let notification = JsonRpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        };
        let text = serde_json::to_string(&notification).map_err(JsonRpcError::Serialization)?;
        self.outbound_sender
            .send(text)
            .map_err(|_| JsonRpcError::Transport("outbound channel closed".to_string()))
    }
}
