//! Message router: one JSON-RPC connection shared by concurrent requests.
//!
//! Both ends of an MCP connection need the same plumbing: several requests
//! in flight at once, answered out of order, interleaved with requests and
//! notifications coming from the other side.
//!
//! [`MessageRouter`] runs a single background reader task that owns the read
//! half exclusively and dispatches every frame:
//!
//! - **Response** → the `oneshot` of the pending [`request`](MessageRouter::request)
//! - **Request / Notification** → the [`Incoming`] channel returned by
//!   [`start`](MessageRouter::start)
//!
//! Writes are serialized through a mutex-guarded writer, independent of the
//! reader.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::error::{McpError, Result};
use super::protocol::{
    CancelledParams, IncomingRequest, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcResponseOut, MessageKind, classify_message, encode_line, methods,
};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type PendingMap = Arc<RwLock<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// A frame initiated by the other side
#[derive(Debug)]
pub enum Incoming {
    Request(IncomingRequest),
    Notification(JsonRpcNotification),
}

pub struct MessageRouter {
    /// Peer label used in logs
    label: String,
    writer: Mutex<BufWriter<BoxedWriter>>,
    /// Request-response correlation (request_id -> oneshot sender)
    pending: PendingMap,
    /// Cancelled once the reader loop has ended
    closed: CancellationToken,
    reader_handle: JoinHandle<()>,
}

impl MessageRouter {
    /// Start routing over a reader/writer pair.
    ///
    /// The returned receiver yields every request and notification sent by
    /// the peer, and ends when the connection closes. Requests must be
    /// answered with [`respond`](Self::respond).
    pub fn start<R, W>(
        label: impl Into<String>,
        reader: R,
        writer: W,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Incoming>)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let label = label.into();
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let closed = CancellationToken::new();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        let reader_handle = tokio::spawn(Self::reader_loop(
            label.clone(),
            Box::new(reader),
            Arc::clone(&pending),
            incoming_tx,
            closed.clone(),
        ));

        let writer: BoxedWriter = Box::new(writer);
        let router = Arc::new(Self {
            label,
            writer: Mutex::new(BufWriter::new(writer)),
            pending,
            closed,
            reader_handle,
        });
        (router, incoming_rx)
    }

    /// Background reader loop, single owner of the read half.
    ///
    /// When the loop exits every pending sender is dropped, so waiting
    /// requests observe [`McpError::TransportClosed`].
    async fn reader_loop(
        label: String,
        reader: BoxedReader,
        pending: PendingMap,
        incoming: mpsc::UnboundedSender<Incoming>,
        closed: CancellationToken,
    ) {
        let mut lines = BufReader::new(reader).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(peer = %label, "Reader loop: connection closed");
                    break;
                }
                Err(e) => {
                    warn!(peer = %label, error = %e, "Reader loop: read error");
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!(peer = %label, "Received: {}", line);

            let json: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(e) => {
                    warn!(peer = %label, error = %e, "Failed to parse JSON frame, skipping");
                    continue;
                }
            };

            match classify_message(&json) {
                MessageKind::Response => Self::dispatch_response(&label, &pending, json).await,
                MessageKind::Request => match serde_json::from_value::<IncomingRequest>(json) {
                    Ok(request) => {
                        let _ = incoming.send(Incoming::Request(request));
                    }
                    Err(e) => warn!(peer = %label, error = %e, "Malformed request frame"),
                },
                MessageKind::Notification => {
                    match serde_json::from_value::<JsonRpcNotification>(json) {
                        Ok(notification) => {
                            let _ = incoming.send(Incoming::Notification(notification));
                        }
                        Err(e) => warn!(peer = %label, error = %e, "Malformed notification frame"),
                    }
                }
                MessageKind::Invalid => {
                    debug!(peer = %label, "Ignoring frame without id or method");
                }
            }
        }

        pending.write().await.clear();
        closed.cancel();
    }

    async fn dispatch_response(label: &str, pending: &PendingMap, json: Value) {
        let Some(id) = json.get("id").and_then(Value::as_u64) else {
            debug!(peer = %label, "Response with a foreign id, dropping");
            return;
        };
        let response: JsonRpcResponse = match serde_json::from_value(json) {
            Ok(r) => r,
            Err(e) => {
                warn!(peer = %label, error = %e, "Failed to parse response");
                return;
            }
        };

        let sender = pending.write().await.remove(&id);
        match sender {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => debug!(peer = %label, id, "No pending receiver for response"),
        }
    }

    /// Send a request and wait for its response.
    ///
    /// On timeout or cancellation the peer is told via
    /// `notifications/cancelled`.
    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        if self.closed.is_cancelled() {
            return Err(McpError::TransportClosed);
        }

        let request = JsonRpcRequest::new(method, params);
        let id = request.id;
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(id, tx);

        if let Err(e) = self.send(&request).await {
            self.pending.write().await.remove(&id);
            return Err(e);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(McpError::Cancelled),
            received = tokio::time::timeout(timeout, rx) => match received {
                Ok(Ok(response)) => response.into_result(),
                Ok(Err(_)) => Err(McpError::TransportClosed),
                Err(_) => Err(McpError::Timeout(method.to_string())),
            },
            _ = self.closed.cancelled() => Err(McpError::TransportClosed),
        };

        if let Err(e @ (McpError::Cancelled | McpError::Timeout(_))) = &outcome {
            self.pending.write().await.remove(&id);
            self.cancel_remote(id, e.to_string()).await;
        }
        outcome
    }

    async fn cancel_remote(&self, id: u64, reason: String) {
        let params = CancelledParams {
            request_id: id.into(),
            reason: Some(reason),
        };
        let sent = match serde_json::to_value(params) {
            Ok(params) => self.notify(methods::CANCELLED, Some(params)).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = sent {
            debug!(peer = %self.label, id, error = %e, "Could not send cancellation");
        }
    }

    /// Send a notification
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.send(&JsonRpcNotification::new(method, params)).await
    }

    /// Answer a request received through the [`Incoming`] channel
    pub async fn respond(&self, response: &JsonRpcResponseOut) -> Result<()> {
        self.send(response).await
    }

    async fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let frame = encode_line(message)?;
        trace!(peer = %self.label, "Sending: {}", String::from_utf8_lossy(&frame).trim_end());

        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection has closed
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

impl Drop for MessageRouter {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}
