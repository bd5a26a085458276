//! Proxy loader: republishes the tools of discovered servers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolRequest, CallToolResult, ToolDescriptor, ToolError};
use tracing::{debug, warn};

use crate::ports::discovery::DiscoveryStrategy;
use crate::ports::mcp_client::{ClientOptions, McpClient};
use crate::ports::request_context::RequestContext;
use crate::ports::tool_loader::{LoaderError, ToolLoader};

/// Lists every discovered server's tools and forwards calls to the owning
/// server's cached client.
pub struct ProxyToolLoader {
    discovery: Arc<dyn DiscoveryStrategy>,
    client_options: ClientOptions,
    read_only: bool,
    routes: RwLock<HashMap<String, Arc<dyn McpClient>>>,
}

impl ProxyToolLoader {
    pub fn new(
        discovery: Arc<dyn DiscoveryStrategy>,
        client_options: ClientOptions,
        read_only: bool,
    ) -> Self {
        Self {
            discovery,
            client_options,
            read_only,
            routes: RwLock::new(HashMap::new()),
        }
    }

    async fn list_server(
        &self,
        server: &str,
        cancel: &CancellationToken,
    ) -> Result<(Arc<dyn McpClient>, Vec<ToolDescriptor>), LoaderError> {
        let client = self
            .discovery
            .get_or_create_client(server, &self.client_options, cancel)
            .await?;
        let tools = client.list_tools(cancel).await?;
        Ok((client, tools))
    }
}

#[async_trait]
impl ToolLoader for ProxyToolLoader {
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        let providers = self.discovery.discover(cancel).await?;
        let names: Vec<String> = providers.iter().map(|p| p.metadata().name).collect();

        let results = join_all(names.iter().map(|name| self.list_server(name, cancel))).await;

        let mut tools = Vec::new();
        let mut routes: HashMap<String, Arc<dyn McpClient>> = HashMap::new();
        for (server, result) in names.iter().zip(results) {
            let (client, listed) = match result {
                Ok(ok) => ok,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(server = %server, error = %e, "Failed to list server tools, skipping");
                    continue;
                }
            };
            for tool in listed {
                if self.read_only && !tool.is_read_only() {
                    continue;
                }
                if routes.insert(tool.name.clone(), Arc::clone(&client)).is_some() {
                    warn!(tool = %tool.name, server = %server, "Tool name exposed by more than one server; the last one wins");
                }
                tools.push(tool);
            }
        }

        debug!(servers = names.len(), count = tools.len(), "Listed proxied tools");
        *self.routes.write().await = routes;
        Ok(tools)
    }

    async fn call_tool(
        &self,
        request: CallToolRequest,
        _context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        let Some(arguments) = request.arguments else {
            return Ok(ToolError::null_parameters(&request.name).into());
        };

        let client = self.routes.read().await.get(&request.name).cloned();
        let Some(client) = client else {
            return Ok(ToolError::tool_not_found(&request.name).into());
        };

        // arguments are forwarded untouched; the remote result comes back as-is
        Ok(client.call_tool(&request.name, Some(arguments), cancel).await?)
    }
}
