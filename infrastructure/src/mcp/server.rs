//! MCP server: serves a [`ToolRuntime`] over a JSON-RPC stream.
//!
//! | Method | Handling |
//! |--------|----------|
//! | `initialize` | inline; records whether the client can sample |
//! | `ping` | inline |
//! | `tools/list` | own task, cancellable |
//! | `tools/call` | own task, cancellable, with a [`RequestContext`] for sampling and progress |
//! | `notifications/cancelled` | cancels the matching in-flight task |
//!
//! A cancelled request gets no response.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use toolhub_application::{RequestContext, SamplingError, ToolRuntime};
use toolhub_domain::{CallToolRequest, SamplingRequest};
use tracing::{debug, error, info, trace, warn};

use super::error::{McpError, Result};
use super::protocol::{
    CallToolParams, CancelledParams, CreateMessageParams, CreateMessageResult, Implementation,
    IncomingRequest, InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcResponseOut,
    ListToolsResult, ProgressParams, ServerCapabilities, error_codes, methods, negotiate_version,
};
use super::router::{Incoming, MessageRouter};

/// Default deadline for one sampling round-trip
const SAMPLING_TIMEOUT: Duration = Duration::from_secs(120);

pub struct McpServer {
    runtime: Arc<ToolRuntime>,
    info: Implementation,
    instructions: Option<String>,
    sampling_timeout: Duration,
}

impl McpServer {
    pub fn new(runtime: Arc<ToolRuntime>) -> Self {
        Self {
            runtime,
            info: Implementation::new("toolhub", env!("CARGO_PKG_VERSION")),
            instructions: None,
            sampling_timeout: SAMPLING_TIMEOUT,
        }
    }

    pub fn with_info(mut self, info: Implementation) -> Self {
        self.info = info;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_sampling_timeout(mut self, timeout: Duration) -> Self {
        self.sampling_timeout = timeout;
        self
    }

    /// Serve on this process's stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self, shutdown: CancellationToken) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout(), shutdown)
            .await
    }

    /// Serve one client until it disconnects or `shutdown` fires.
    pub async fn serve<R, W>(self, reader: R, writer: W, shutdown: CancellationToken) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (router, mut incoming) = MessageRouter::start("client", reader, writer);
        let session = Arc::new(Session {
            runtime: Arc::clone(&self.runtime),
            router,
            sampling: AtomicBool::new(false),
            in_flight: Mutex::new(HashMap::new()),
            sampling_timeout: self.sampling_timeout,
        });
        let mut tasks = JoinSet::new();

        info!(server = %self.info.name, "Serving MCP");

        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        error!("Request task panicked");
                    }
                    continue;
                }
                message = incoming.recv() => match message {
                    Some(message) => message,
                    None => {
                        info!("Client disconnected");
                        break;
                    }
                },
            };

            match message {
                Incoming::Request(request) => self.handle_request(&session, &mut tasks, request).await,
                Incoming::Notification(notification) => session.handle_notification(notification),
            }
        }

        session.cancel_all();
        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    async fn handle_request(
        &self,
        session: &Arc<Session>,
        tasks: &mut JoinSet<()>,
        request: IncomingRequest,
    ) {
        debug!(method = %request.method, id = %request.id, "Request");
        match request.method.as_str() {
            methods::INITIALIZE => {
                let response = self.initialize(session, request);
                session.respond(response).await;
            }
            methods::PING => {
                session
                    .respond(JsonRpcResponseOut::success(request.id, json!({})))
                    .await;
            }
            methods::TOOLS_LIST => {
                let cancel = session.register(&request.id);
                let session = Arc::clone(session);
                tasks.spawn(async move {
                    session.list_tools(request.id, cancel).await;
                });
            }
            methods::TOOLS_CALL => {
                let params: CallToolParams = match request
                    .params
                    .clone()
                    .map(serde_json::from_value)
                    .transpose()
                {
                    Ok(Some(params)) => params,
                    Ok(None) => {
                        session.respond(invalid_params(request.id, "missing params")).await;
                        return;
                    }
                    Err(e) => {
                        session.respond(invalid_params(request.id, e.to_string())).await;
                        return;
                    }
                };
                let cancel = session.register(&request.id);
                let session = Arc::clone(session);
                tasks.spawn(async move {
                    session.call_tool(request.id, params, cancel).await;
                });
            }
            other => {
                debug!(method = %other, "Unknown method");
                session
                    .respond(JsonRpcResponseOut::failure(
                        request.id,
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method '{}' not found", other),
                    ))
                    .await;
            }
        }
    }

    fn initialize(&self, session: &Session, request: IncomingRequest) -> JsonRpcResponseOut {
        let params: InitializeParams = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => return invalid_params(request.id, e.to_string()),
            None => return invalid_params(request.id, "missing params"),
        };

        let sampling = params.capabilities.supports_sampling();
        session.sampling.store(sampling, Ordering::SeqCst);
        info!(
            client = %params.client_info.name,
            protocol = %params.protocol_version,
            sampling,
            "Client initialized"
        );

        let result = InitializeResult {
            protocol_version: negotiate_version(&params.protocol_version).to_string(),
            capabilities: ServerCapabilities {
                tools: Some(json!({ "listChanged": false })),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponseOut::success(request.id, value),
            Err(e) => internal_error(request.id, e.to_string()),
        }
    }
}

/// Per-connection state shared with request tasks
struct Session {
    runtime: Arc<ToolRuntime>,
    router: Arc<MessageRouter>,
    /// Whether the client advertised sampling
    sampling: AtomicBool,
    /// Request id (JSON text) → cancellation token
    in_flight: Mutex<HashMap<String, CancellationToken>>,
    sampling_timeout: Duration,
}

impl Session {
    fn register(&self, id: &Value) -> CancellationToken {
        let token = CancellationToken::new();
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string(), token.clone());
        token
    }

    fn finish(&self, id: &Value) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id.to_string());
    }

    fn cancel_all(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        for (_, token) in in_flight.drain() {
            token.cancel();
        }
    }

    async fn respond(&self, response: JsonRpcResponseOut) {
        if let Err(e) = self.router.respond(&response).await {
            warn!(error = %e, "Failed to write response");
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            methods::CANCELLED => {
                let params: Option<CancelledParams> = notification
                    .params
                    .and_then(|p| serde_json::from_value(p).ok());
                let Some(params) = params else {
                    debug!("Malformed cancellation notification");
                    return;
                };
                let token = self
                    .in_flight
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(&params.request_id.to_string())
                    .cloned();
                match token {
                    Some(token) => {
                        info!(id = %params.request_id, reason = ?params.reason, "Request cancelled by client");
                        token.cancel();
                    }
                    None => debug!(id = %params.request_id, "Cancellation for an unknown request"),
                }
            }
            methods::INITIALIZED => debug!("Client finished initialization"),
            other => trace!(method = %other, "Ignoring notification"),
        }
    }

    async fn list_tools(&self, id: Value, cancel: CancellationToken) {
        let outcome = self.runtime.list_tools(&cancel).await;
        self.finish(&id);

        let response = match outcome {
            Ok(tools) => {
                let result = ListToolsResult {
                    tools,
                    next_cursor: None,
                };
                match serde_json::to_value(result) {
                    Ok(value) => JsonRpcResponseOut::success(id, value),
                    Err(e) => internal_error(id, e.to_string()),
                }
            }
            Err(e) if e.is_cancelled() => {
                debug!(id = %id, "tools/list cancelled");
                return;
            }
            Err(e) => {
                error!(error = %e, "tools/list failed");
                internal_error(id, e.to_string())
            }
        };
        self.respond(response).await;
    }

    async fn call_tool(&self, id: Value, params: CallToolParams, cancel: CancellationToken) {
        let context = ClientRequestContext {
            router: Arc::clone(&self.router),
            sampling: self.sampling.load(Ordering::SeqCst),
            progress_token: params.progress_token().cloned(),
            progress: AtomicU64::new(0),
            sampling_timeout: self.sampling_timeout,
        };
        let request = CallToolRequest {
            name: params.name,
            arguments: params.arguments,
        };

        let outcome = self.runtime.call_tool(request, &context, &cancel).await;
        self.finish(&id);

        let response = match outcome {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponseOut::success(id, value),
                Err(e) => internal_error(id, e.to_string()),
            },
            Err(e) if e.is_cancelled() => {
                debug!(id = %id, "tools/call cancelled");
                return;
            }
            Err(e) => {
                error!(error = %e, "tools/call failed");
                internal_error(id, e.to_string())
            }
        };
        self.respond(response).await;
    }
}

fn invalid_params(id: Value, message: impl Into<String>) -> JsonRpcResponseOut {
    JsonRpcResponseOut::failure(id, error_codes::INVALID_PARAMS, message)
}

fn internal_error(id: Value, message: impl Into<String>) -> JsonRpcResponseOut {
    JsonRpcResponseOut::failure(id, error_codes::INTERNAL_ERROR, message)
}

/// Sampling and progress back to the client of one `tools/call`
struct ClientRequestContext {
    router: Arc<MessageRouter>,
    sampling: bool,
    progress_token: Option<Value>,
    progress: AtomicU64,
    sampling_timeout: Duration,
}

#[async_trait]
impl RequestContext for ClientRequestContext {
    fn supports_sampling(&self) -> bool {
        self.sampling
    }

    async fn sample(
        &self,
        request: SamplingRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, SamplingError> {
        if !self.sampling {
            return Err(SamplingError::NotSupported);
        }

        let params = serde_json::to_value(CreateMessageParams::from(&request))
            .map_err(|e| SamplingError::Failed(e.to_string()))?;
        let value = self
            .router
            .request(
                methods::CREATE_MESSAGE,
                Some(params),
                self.sampling_timeout,
                cancel,
            )
            .await
            .map_err(|e| match e {
                McpError::Cancelled => SamplingError::Cancelled,
                other => SamplingError::Failed(other.to_string()),
            })?;

        let result: CreateMessageResult =
            serde_json::from_value(value).map_err(|e| SamplingError::Failed(e.to_string()))?;
        trace!(model = ?result.model, "Sampling answered");
        result
            .text()
            .ok_or_else(|| SamplingError::Failed("the answer carried no text".to_string()))
    }

    async fn notify_progress(&self, message: &str) {
        let Some(token) = &self.progress_token else {
            return;
        };
        let progress = self.progress.fetch_add(1, Ordering::SeqCst) + 1;
        let params = ProgressParams {
            progress_token: token.clone(),
            progress: progress as f64,
            total: None,
            message: Some(message.to_string()),
        };

        let sent = match serde_json::to_value(params) {
            Ok(params) => self.router.notify(methods::PROGRESS, Some(params)).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = sent {
            debug!(error = %e, "Failed to send progress notification");
        }
    }
}
