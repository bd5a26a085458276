//! Composite loader: several loaders merged into one tool list.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolRequest, CallToolResult, ToolDescriptor, ToolError};
use tracing::{debug, warn};

use crate::ports::request_context::RequestContext;
use crate::ports::tool_loader::{LoaderError, ToolLoader};

/// Aggregates loaders and routes calls to the one that listed the tool.
///
/// The routing table is rebuilt wholesale on every `list_tools`. When two
/// loaders expose the same name the later loader wins and a warning is
/// logged.
pub struct CompositeToolLoader {
    loaders: Vec<Arc<dyn ToolLoader>>,
    routes: RwLock<HashMap<String, Arc<dyn ToolLoader>>>,
}

impl CompositeToolLoader {
    pub fn new(loaders: Vec<Arc<dyn ToolLoader>>) -> Self {
        Self {
            loaders,
            routes: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ToolLoader for CompositeToolLoader {
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        let results = join_all(self.loaders.iter().map(|l| l.list_tools(cancel))).await;

        let mut tools = Vec::new();
        let mut routes: HashMap<String, Arc<dyn ToolLoader>> = HashMap::new();
        for (loader, result) in self.loaders.iter().zip(results) {
            let listed = match result {
                Ok(listed) => listed,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Tool loader failed to list tools, skipping");
                    continue;
                }
            };
            for tool in listed {
                if routes.insert(tool.name.clone(), Arc::clone(loader)).is_some() {
                    warn!(tool = %tool.name, "Tool name exposed by more than one loader; the last one wins");
                }
                tools.push(tool);
            }
        }

        debug!(count = tools.len(), "Rebuilt composite routing table");
        *self.routes.write().await = routes;
        Ok(tools)
    }

    async fn call_tool(
        &self,
        request: CallToolRequest,
        context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        if request.arguments.is_none() {
            return Ok(ToolError::null_parameters(&request.name).into());
        }

        let loader = self.routes.read().await.get(&request.name).cloned();
        match loader {
            Some(loader) => loader.call_tool(request, context, cancel).await,
            None => Ok(ToolError::tool_not_found(&request.name).into()),
        }
    }
}
