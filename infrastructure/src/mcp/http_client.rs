//! MCP client for remote servers reached over HTTP.
//!
//! Every JSON-RPC message is POSTed to the server URL. The server answers
//! either with a JSON body or with a short `text/event-stream` that carries
//! the response as one of its events. A session id handed out in the
//! `Mcp-Session-Id` header is echoed on every later request.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use toolhub_application::{ClientError, ClientOptions, McpClient};
use toolhub_domain::core::string::truncate;
use toolhub_domain::{CallToolResult, ToolDescriptor};
use tracing::{debug, info};

use super::client::{self, RequestChannel};
use super::error::{McpError, Result};
use super::protocol::{
    Implementation, InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, MessageKind, classify_message, methods,
};

const SESSION_HEADER: &str = "Mcp-Session-Id";
const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

pub struct HttpMcpClient {
    server: String,
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
    session_id: RwLock<Option<String>>,
    protocol_version: RwLock<Option<String>>,
}

impl HttpMcpClient {
    /// Open a session with the server at `url`.
    pub async fn connect(
        server: &str,
        url: &str,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let client = Self {
            server: server.to_string(),
            url: url.to_string(),
            http,
            request_timeout: options.request_timeout,
            session_id: RwLock::new(None),
            protocol_version: RwLock::new(None),
        };

        let params = InitializeParams::new(Implementation::new(
            &options.client_name,
            &options.client_version,
        ));
        let value = client
            .exchange(
                methods::INITIALIZE,
                Some(serde_json::to_value(params)?),
                options.init_timeout,
                cancel,
            )
            .await?;
        let result: InitializeResult = serde_json::from_value(value)?;
        info!(
            server = %server,
            url = %url,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "Connected to HTTP server"
        );
        if let Ok(mut version) = client.protocol_version.write() {
            *version = Some(result.protocol_version);
        }

        let initialized = JsonRpcNotification::new(methods::INITIALIZED, None);
        client
            .post(methods::INITIALIZED, &initialized, options.init_timeout)
            .await?;
        Ok(client)
    }

    async fn exchange(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let request = JsonRpcRequest::new(method, params);
        let id = request.id;

        let round_trip = async {
            let response = self.post(method, &request, timeout).await?;
            read_response(response, id).await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(McpError::Cancelled),
            result = round_trip => result?.into_result(),
        }
    }

    async fn post<T: Serialize>(
        &self,
        method: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .timeout(timeout)
            .json(body);
        if let Some(session) = self.session_id() {
            builder = builder.header(SESSION_HEADER, session);
        }
        if let Some(version) = self.protocol_version.read().ok().and_then(|v| v.clone()) {
            builder = builder.header(PROTOCOL_VERSION_HEADER, version);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                McpError::Timeout(method.to_string())
            } else {
                McpError::from(e)
            }
        })?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            && let Ok(mut slot) = self.session_id.write()
            && slot.as_deref() != Some(session)
        {
            debug!(server = %self.server, "Server assigned session id");
            *slot = Some(session.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Http(format!(
                "{} answered {} to '{}': {}",
                self.url,
                status,
                method,
                truncate(body.trim(), 200)
            )));
        }
        Ok(response)
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().ok().and_then(|s| s.clone())
    }
}

async fn read_response(response: reqwest::Response, id: u64) -> Result<JsonRpcResponse> {
    let is_event_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));
    let body = response.text().await?;

    if is_event_stream {
        find_event_stream_response(&body, id)
    } else {
        Ok(serde_json::from_str(&body)?)
    }
}

/// Pick the response to request `id` out of an event stream body.
///
/// Each event's `data:` lines are joined and parsed as one JSON-RPC
/// message. Requests and notifications the server interleaves are skipped.
pub(crate) fn find_event_stream_response(body: &str, id: u64) -> Result<JsonRpcResponse> {
    let mut data: Vec<&str> = Vec::new();
    let mut events: Vec<String> = Vec::new();

    for line in body.lines() {
        if line.is_empty() {
            if !data.is_empty() {
                events.push(data.join("\n"));
                data.clear();
            }
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if !data.is_empty() {
        events.push(data.join("\n"));
    }

    for event in events {
        let Ok(json) = serde_json::from_str::<Value>(&event) else {
            continue;
        };
        if classify_message(&json) == MessageKind::Response
            && json.get("id").and_then(Value::as_u64) == Some(id)
        {
            return Ok(serde_json::from_value(json)?);
        }
    }

    Err(McpError::UnexpectedResponse(format!(
        "event stream ended without a response to request {}",
        id
    )))
}

#[async_trait]
impl RequestChannel for HttpMcpClient {
    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.exchange(method, params, self.request_timeout, cancel)
            .await
    }
}

#[async_trait]
impl McpClient for HttpMcpClient {
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ToolDescriptor>, ClientError> {
        Ok(client::list_all_tools(self, &self.server, cancel).await?)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> std::result::Result<CallToolResult, ClientError> {
        Ok(client::call_tool(self, name, arguments, cancel).await?)
    }
}
