//! MCP client port
//!
//! A client is a live channel to one server. It is shared by every call
//! routed to that server and must accept concurrent requests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolResult, ToolDescriptor};

/// Errors raised by a client or while creating one
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Request '{0}' timed out")]
    Timeout(String),

    #[error("Connection closed")]
    Closed,

    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// Settings applied when a client is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Name announced in the `initialize` handshake
    pub client_name: String,
    /// Version announced in the `initialize` handshake
    pub client_version: String,
    /// Deadline for the `initialize` handshake
    pub init_timeout: Duration,
    /// Deadline for each request after initialization
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            client_name: "toolhub".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            init_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ClientOptions {
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Port for talking to one tool server
#[async_trait]
pub trait McpClient: Send + Sync {
    /// List every tool the server exposes
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, ClientError>;

    /// Invoke a tool; a failed tool is an `Ok` result with `is_error` set
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ClientError>;
}
