//! Tool runtime use case
//!
//! The outermost adapter between the protocol server and the configured
//! [`ToolLoader`]. It opens a tracing span per request, applies the
//! read-only filter and call guard, and turns every loader failure into an
//! error result so a single tool call can never fail the server.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolRequest, CallToolResult, ToolDescriptor, ToolError};
use tracing::{Instrument, debug, error, info_span, warn};

use crate::ports::discovery::DiscoveryError;
use crate::ports::mcp_client::ClientError;
use crate::ports::request_context::RequestContext;
use crate::ports::tool_loader::{LoaderError, ToolLoader};

/// Serves `tools/list` and `tools/call` on top of one loader
pub struct ToolRuntime {
    loader: Arc<dyn ToolLoader>,
    read_only: bool,
    /// Tool name → read-only hint, from the latest listing
    listed: RwLock<HashMap<String, bool>>,
}

impl ToolRuntime {
    pub fn new(loader: Arc<dyn ToolLoader>, read_only: bool) -> Self {
        Self {
            loader,
            read_only,
            listed: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// List tools, keeping only read-only ones in read-only mode.
    pub async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        let span = info_span!("tools/list", read_only = self.read_only);
        async {
            let tools = self.loader.list_tools(cancel).await?;

            let listed = tools
                .iter()
                .map(|t| (t.name.clone(), t.is_read_only()))
                .collect();
            *self.listed.write().await = listed;

            let tools: Vec<ToolDescriptor> = tools
                .into_iter()
                .filter(|t| !self.read_only || t.is_read_only())
                .collect();
            debug!(count = tools.len(), "Listed tools");
            Ok(tools)
        }
        .instrument(span)
        .await
    }

    /// Call a tool. Only cancellation is returned as `Err`.
    pub async fn call_tool(
        &self,
        request: CallToolRequest,
        context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        let span = info_span!("tools/call", tool = %request.name);
        async {
            if self.read_only
                && let Some(denied) = self.read_only_guard(&request.name, cancel).await?
            {
                return Ok(denied);
            }

            let tool = request.name.clone();
            match self.loader.call_tool(request, context, cancel).await {
                Ok(result) => Ok(result),
                Err(e) if e.is_cancelled() => Err(LoaderError::Cancelled),
                Err(e) => {
                    error!(tool = %tool, error = %e, "Tool call failed");
                    Ok(error_result(&tool, &e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// `Some(result)` when read-only mode must refuse the call
    async fn read_only_guard(
        &self,
        tool: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CallToolResult>, LoaderError> {
        if self.listed.read().await.is_empty() {
            // nothing listed yet: populate the table before deciding
            if let Err(e) = self.list_tools(cancel).await {
                if e.is_cancelled() {
                    return Err(e);
                }
                warn!(error = %e, "Could not list tools for the read-only check");
            }
        }

        let verdict = match self.listed.read().await.get(tool) {
            Some(true) => None,
            Some(false) => {
                warn!(tool = %tool, "Refusing non read-only tool in read-only mode");
                Some(ToolError::permission_denied(tool).into())
            }
            None => Some(ToolError::tool_not_found(tool).into()),
        };
        Ok(verdict)
    }
}

/// Convert a loader failure into a diagnostic error result.
fn error_result(tool: &str, error: &LoaderError) -> CallToolResult {
    let tool_error = match error {
        LoaderError::Execution { message, .. } => {
            ToolError::execution_failed(format!("Tool '{}' failed: {}", tool, message))
        }
        LoaderError::Discovery(DiscoveryError::NotFound(server)) => {
            ToolError::server_not_found(server.clone())
        }
        LoaderError::Discovery(DiscoveryError::Configuration(message)) => {
            ToolError::configuration(message.clone())
        }
        LoaderError::Discovery(DiscoveryError::Client { source, .. })
        | LoaderError::Client(source) => client_error(tool, source),
        other => ToolError::execution_failed(other.to_string()),
    };
    tool_error.into()
}

fn client_error(tool: &str, error: &ClientError) -> ToolError {
    match error {
        ClientError::Configuration(message) => ToolError::configuration(message.clone()),
        ClientError::Remote { message, .. } => {
            ToolError::execution_failed(format!("Tool '{}' failed remotely: {}", tool, message))
        }
        other => ToolError::transport(format!("Tool '{}' is unreachable: {}", tool, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::request_context::NoRequestContext;
    use crate::test_support::{StubLoader, tool};
    use async_trait::async_trait;
    use serde_json::Map;

    struct FailingLoader {
        error: LoaderError,
    }

    #[async_trait]
    impl ToolLoader for FailingLoader {
        async fn list_tools(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ToolDescriptor>, LoaderError> {
            Ok(vec![tool("storage-account-delete", false)])
        }

        async fn call_tool(
            &self,
            _request: CallToolRequest,
            _context: &dyn RequestContext,
            _cancel: &CancellationToken,
        ) -> Result<CallToolResult, LoaderError> {
            Err(self.error.clone())
        }
    }

    fn stub() -> Arc<dyn ToolLoader> {
        Arc::new(StubLoader {
            label: "stub",
            tools: vec![tool("storage-account-list", true), tool("storage-account-delete", false)],
        })
    }

    fn call(name: &str) -> CallToolRequest {
        CallToolRequest::new(name).with_arguments(Map::new())
    }

    #[tokio::test]
    async fn test_read_only_list_is_subset() {
        let cancel = CancellationToken::new();
        let all = ToolRuntime::new(stub(), false).list_tools(&cancel).await.unwrap();
        let ro = ToolRuntime::new(stub(), true).list_tools(&cancel).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(ro.len(), 1);
        assert!(ro.iter().all(|t| all.contains(t)));
    }

    #[tokio::test]
    async fn test_read_only_call_guard() {
        let runtime = ToolRuntime::new(stub(), true);
        let cancel = CancellationToken::new();

        // the guard lists on its own when nothing was listed yet
        let denied = runtime
            .call_tool(call("storage-account-delete"), &NoRequestContext, &cancel)
            .await
            .unwrap();
        assert!(denied.is_error);
        assert!(denied.text_content().contains("PERMISSION_DENIED"));

        let allowed = runtime
            .call_tool(call("storage-account-list"), &NoRequestContext, &cancel)
            .await
            .unwrap();
        assert_eq!(allowed.text_content(), "stub:storage-account-list");

        let unknown = runtime
            .call_tool(call("compute-vm-list"), &NoRequestContext, &cancel)
            .await
            .unwrap();
        assert!(unknown.text_content().contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_execution_error_becomes_result() {
        let runtime = ToolRuntime::new(
            Arc::new(FailingLoader {
                error: LoaderError::Execution {
                    tool: "storage-account-delete".into(),
                    message: "account is locked".into(),
                },
            }),
            false,
        );
        let result = runtime
            .call_tool(call("storage-account-delete"), &NoRequestContext, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("EXECUTION_FAILED"));
        assert!(result.text_content().contains("account is locked"));
    }

    #[tokio::test]
    async fn test_transport_error_becomes_result() {
        let runtime = ToolRuntime::new(
            Arc::new(FailingLoader {
                error: LoaderError::Client(ClientError::Closed),
            }),
            false,
        );
        let result = runtime
            .call_tool(call("docs-search"), &NoRequestContext, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.text_content().starts_with("[TRANSPORT]"));
    }

    #[tokio::test]
    async fn test_cancellation_is_propagated() {
        let runtime = ToolRuntime::new(
            Arc::new(FailingLoader {
                error: LoaderError::Cancelled,
            }),
            false,
        );
        let err = runtime
            .call_tool(call("x"), &NoRequestContext, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
