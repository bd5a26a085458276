//! Tool loader port
//!
//! The protocol-facing contract: list tools and call one. Expected failures
//! (unknown tool, bad arguments) come back as `Ok` error results; `Err` is
//! reserved for failures the runtime must log and convert.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolRequest, CallToolResult, ToolDescriptor};

use super::discovery::DiscoveryError;
use super::mcp_client::ClientError;
use super::request_context::RequestContext;

/// Errors raised by a tool loader
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl LoaderError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            LoaderError::Cancelled => true,
            LoaderError::Discovery(e) => e.is_cancelled(),
            LoaderError::Client(e) => e.is_cancelled(),
            LoaderError::Execution { .. } => false,
        }
    }
}

/// Port for serving `tools/list` and `tools/call`
#[async_trait]
pub trait ToolLoader: Send + Sync {
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError>;

    async fn call_tool(
        &self,
        request: CallToolRequest,
        context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError>;
}
