//! Single gateway tool with learn → command navigation.
//!
//! One advertised tool replaces every server's tool list. Callers first
//! learn the server catalog, then one server's command catalog, then call a
//! command. When the caller supports sampling and states an intent, the
//! loader asks the caller's model to take those steps on its behalf.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use toolhub_domain::intent::{
    HELP_TEXT, command_failure_message, command_selection_request, format_command_catalog,
    gateway_descriptor, parse_command_choice, parse_server_choice, server_selection_request,
};
use toolhub_domain::server::format_server_catalog;
use toolhub_domain::{
    CallToolRequest, CallToolResult, IntentMode, IntentRequest, ServerMetadata, ToolDescriptor,
    ToolError,
};
use tracing::{debug, info, warn};

use crate::discovery::client_cache::{OnceMap, OnceSlot};
use crate::ports::discovery::{DiscoveryError, DiscoveryStrategy};
use crate::ports::mcp_client::ClientOptions;
use crate::ports::request_context::{RequestContext, SamplingError};
use crate::ports::tool_loader::{LoaderError, ToolLoader};

/// Serves the single gateway tool.
pub struct SingleToolLoader {
    discovery: Arc<dyn DiscoveryStrategy>,
    client_options: ClientOptions,
    tool_name: String,
    read_only: bool,
    root_catalog: OnceSlot<Arc<Vec<ServerMetadata>>>,
    tool_catalogs: OnceMap<Arc<Vec<ToolDescriptor>>>,
}

impl SingleToolLoader {
    pub fn new(
        discovery: Arc<dyn DiscoveryStrategy>,
        client_options: ClientOptions,
        tool_name: impl Into<String>,
        read_only: bool,
    ) -> Self {
        Self {
            discovery,
            client_options,
            tool_name: tool_name.into(),
            read_only,
            root_catalog: OnceSlot::new(),
            tool_catalogs: OnceMap::new(),
        }
    }

    /// Forget cached server and command catalogs; the next learn call
    /// rediscovers them.
    pub async fn invalidate_catalogs(&self) {
        self.root_catalog.reset().await;
        self.tool_catalogs.clear().await;
    }

    async fn servers(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<ServerMetadata>>, DiscoveryError> {
        self.root_catalog
            .get_or_try_init(|| async {
                let providers = self.discovery.discover(cancel).await?;
                let servers: Vec<ServerMetadata> = providers.iter().map(|p| p.metadata()).collect();
                Ok(Arc::new(servers))
            })
            .await
    }

    async fn commands(
        &self,
        tool: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<ToolDescriptor>>, LoaderError> {
        self.tool_catalogs
            .get_or_try_init(tool, || async {
                let client = self
                    .discovery
                    .get_or_create_client(tool, &self.client_options, cancel)
                    .await?;
                let tools = client.list_tools(cancel).await?;
                let tools: Vec<ToolDescriptor> = tools
                    .into_iter()
                    .filter(|t| !self.read_only || t.is_read_only())
                    .collect();
                Ok(Arc::new(tools))
            })
            .await
    }

    fn root_learn<'a>(
        &'a self,
        request: IntentRequest,
        context: &'a dyn RequestContext,
        cancel: &'a CancellationToken,
        allow_sampling: bool,
    ) -> BoxFuture<'a, Result<CallToolResult, LoaderError>> {
        Box::pin(async move {
            let servers = self.servers(cancel).await?;

            if allow_sampling
                && context.supports_sampling()
                && let Some(intent) = request.intent_text()
            {
                let prompt = server_selection_request(intent, &servers);
                match context.sample(prompt, cancel).await {
                    Ok(answer) => match parse_server_choice(&answer, &servers) {
                        Some(server) => {
                            info!(server = %server, "Sampling picked a server");
                            let next = request.learning_tool(server);
                            return self.tool_learn(next, context, cancel).await;
                        }
                        None => debug!(answer = %answer.trim(), "Sampling matched no server"),
                    },
                    Err(SamplingError::Cancelled) => return Err(LoaderError::Cancelled),
                    Err(e) => warn!(error = %e, "Server selection sampling failed"),
                }
            }

            Ok(CallToolResult::text(format_server_catalog(&servers)))
        })
    }

    fn tool_learn<'a>(
        &'a self,
        request: IntentRequest,
        context: &'a dyn RequestContext,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<CallToolResult, LoaderError>> {
        Box::pin(async move {
            let Some(tool) = request.tool.clone() else {
                return self.root_learn(request, context, cancel, false).await;
            };

            let commands = match self.commands(&tool, cancel).await {
                Ok(commands) => commands,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(tool = %tool, error = %e, "Could not load command catalog, showing servers");
                    return self.root_learn(request, context, cancel, false).await;
                }
            };

            if context.supports_sampling()
                && let Some(intent) = request.intent_text()
            {
                let prompt = command_selection_request(intent, &tool, &commands, &request.parameters);
                match context.sample(prompt, cancel).await {
                    Ok(answer) => match parse_command_choice(&answer, &commands, &request.parameters) {
                        Some(choice) => {
                            info!(tool = %tool, command = %choice.command, "Sampling picked a command");
                            let next = request.invoking(choice.command, choice.parameters);
                            return self.command_mode(next, context, cancel).await;
                        }
                        None => debug!(tool = %tool, answer = %answer.trim(), "Sampling matched no command"),
                    },
                    Err(SamplingError::Cancelled) => return Err(LoaderError::Cancelled),
                    Err(e) => warn!(tool = %tool, error = %e, "Command selection sampling failed"),
                }
            }

            Ok(CallToolResult::text(format_command_catalog(&tool, &commands)))
        })
    }

    fn command_mode<'a>(
        &'a self,
        request: IntentRequest,
        context: &'a dyn RequestContext,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<CallToolResult, LoaderError>> {
        Box::pin(async move {
            let (Some(tool), Some(command)) = (request.tool.clone(), request.command.clone()) else {
                return Ok(CallToolResult::text(HELP_TEXT));
            };

            let client = match self
                .discovery
                .get_or_create_client(&tool, &self.client_options, cancel)
                .await
            {
                Ok(client) => client,
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    warn!(tool = %tool, command = %command, error = %e, "Could not resolve server, showing servers");
                    return self.root_learn(request, context, cancel, false).await;
                }
            };

            if self.read_only {
                let allowed = match self.commands(&tool, cancel).await {
                    Ok(commands) => commands.iter().any(|c| c.name == command),
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(_) => false,
                };
                if !allowed {
                    return Ok(ToolError::permission_denied(&command).into());
                }
            }

            context
                .notify_progress(&format!("Calling '{}' on '{}'", command, tool))
                .await;

            match client
                .call_tool(&command, Some(request.parameters), cancel)
                .await
            {
                Ok(result) => Ok(result),
                Err(e) if e.is_cancelled() => Err(LoaderError::Cancelled),
                Err(e) => {
                    warn!(tool = %tool, command = %command, error = %e, "Gateway command failed");
                    Ok(CallToolResult::error(command_failure_message(
                        &tool,
                        &command,
                        &e.to_string(),
                    )))
                }
            }
        })
    }
}

#[async_trait]
impl ToolLoader for SingleToolLoader {
    async fn list_tools(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        Ok(vec![gateway_descriptor(&self.tool_name, self.read_only)])
    }

    async fn call_tool(
        &self,
        request: CallToolRequest,
        context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        if !request.name.eq_ignore_ascii_case(&self.tool_name) {
            return Ok(ToolError::tool_not_found(&request.name).into());
        }
        let Some(arguments) = request.arguments else {
            return Ok(ToolError::null_parameters(&request.name).into());
        };

        let intent = match IntentRequest::from_arguments(&arguments) {
            Ok(intent) => intent,
            Err(e) => {
                return Ok(ToolError::invalid_argument(format!(
                    "Invalid arguments for '{}': {}",
                    request.name, e
                ))
                .into());
            }
        };

        match intent.mode() {
            IntentMode::RootLearn => self.root_learn(intent, context, cancel, true).await,
            IntentMode::ToolLearn { .. } => self.tool_learn(intent, context, cancel).await,
            IntentMode::Command { .. } => self.command_mode(intent, context, cancel).await,
            IntentMode::Help => Ok(CallToolResult::text(HELP_TEXT)),
        }
    }
}
