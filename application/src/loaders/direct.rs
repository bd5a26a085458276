//! Direct loader: the in-process command tree as tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use tokio_util::sync::CancellationToken;
use toolhub_domain::{
    CallToolRequest, CallToolResult, CommandContext, CommandError, CommandTree, ToolDescriptor,
    ToolError, bind_arguments,
};
use tracing::{debug, error};

use crate::config::ServerOptions;
use crate::ports::request_context::RequestContext;
use crate::ports::tool_loader::{LoaderError, ToolLoader};

/// Serves the command tree directly.
///
/// Listing applies the namespace and read-only filters. Calls are scoped to
/// the namespace filter but do not re-check the read-only flag; that guard
/// belongs to the runtime.
pub struct DirectToolLoader {
    tree: Arc<CommandTree>,
    options: ServerOptions,
}

impl DirectToolLoader {
    pub fn new(tree: Arc<CommandTree>, options: ServerOptions) -> Self {
        Self { tree, options }
    }
}

#[async_trait]
impl ToolLoader for DirectToolLoader {
    async fn list_tools(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        let tools: Vec<ToolDescriptor> = self
            .tree
            .visible_commands()
            .filter(|(name, _)| self.options.allows_tool(name))
            .filter(|(_, cmd)| !self.options.read_only || cmd.metadata().read_only)
            .map(|(name, cmd)| ToolDescriptor::from_command(name, cmd.as_ref()))
            .collect();

        debug!(count = tools.len(), "Listed command tree tools");
        Ok(tools)
    }

    async fn call_tool(
        &self,
        request: CallToolRequest,
        _context: &dyn RequestContext,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        let command = match self.tree.find(&request.name) {
            Some(cmd) if self.options.allows_tool(&request.name) => Arc::clone(cmd),
            _ => return Ok(ToolError::tool_not_found(&request.name).into()),
        };

        // tools without options are commonly called with no arguments at all
        let arguments = request.arguments.unwrap_or_else(Map::new);
        let bound = match bind_arguments(&command.options(), &arguments) {
            Ok(bound) => bound,
            Err(issues) => {
                let details: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
                return Ok(ToolError::invalid_argument(format!(
                    "Invalid arguments for '{}': {}",
                    request.name,
                    details.join("; ")
                ))
                .into());
            }
        };

        let context = CommandContext::new(cancel.child_token());
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LoaderError::Cancelled),
            outcome = command.execute(&context, &bound) => outcome,
        };

        match outcome {
            Ok(response) => Ok(CallToolResult::from_command_response(&response)),
            Err(CommandError::Cancelled) => Err(LoaderError::Cancelled),
            Err(e) => {
                error!(tool = %request.name, error = %e, "Command execution failed");
                Err(LoaderError::Execution {
                    tool: request.name,
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::request_context::NoRequestContext;
    use serde_json::json;
    use toolhub_domain::{
        BoundArguments, Command, CommandGroup, CommandMetadata, CommandResponse, OptionSpec,
    };

    struct AccountList;

    #[async_trait]
    impl Command for AccountList {
        fn name(&self) -> &str {
            "list"
        }
        fn description(&self) -> &str {
            "List storage accounts"
        }
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::read_only()
        }
        fn options(&self) -> Vec<OptionSpec> {
            vec![OptionSpec::new("subscription", "Subscription", true)]
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            let sub = args
                .require_string("subscription")
                .map_err(CommandError::InvalidArguments)?;
            Ok(CommandResponse::ok(json!({ "subscription": sub, "accounts": ["acct1"] })))
        }
    }

    struct AccountDelete;

    #[async_trait]
    impl Command for AccountDelete {
        fn name(&self) -> &str {
            "delete"
        }
        fn description(&self) -> &str {
            "Delete a storage account"
        }
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::default()
        }
        fn options(&self) -> Vec<OptionSpec> {
            Vec::new()
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            _args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            Err(CommandError::Failed("account is locked".into()))
        }
    }

    struct SecretGet;

    #[async_trait]
    impl Command for SecretGet {
        fn name(&self) -> &str {
            "get"
        }
        fn description(&self) -> &str {
            "Get a secret"
        }
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::read_only()
        }
        fn options(&self) -> Vec<OptionSpec> {
            Vec::new()
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            _args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            Ok(CommandResponse::ok(json!("s3cret")))
        }
    }

    fn tree() -> Arc<CommandTree> {
        let root = CommandGroup::new("root", "root")
            .with_group(
                CommandGroup::new("storage", "Storage").with_group(
                    CommandGroup::new("account", "Accounts")
                        .with_command(AccountList)
                        .with_command(AccountDelete),
                ),
            )
            .with_group(
                CommandGroup::new("keyvault", "Key Vault")
                    .with_group(CommandGroup::new("secret", "Secrets").with_command(SecretGet)),
            );
        Arc::new(CommandTree::new(root).unwrap())
    }

    async fn names(loader: &DirectToolLoader) -> Vec<String> {
        loader
            .list_tools(&CancellationToken::new())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    #[tokio::test]
    async fn test_list_all() {
        let loader = DirectToolLoader::new(tree(), ServerOptions::default());
        assert_eq!(
            names(&loader).await,
            vec!["storage-account-list", "storage-account-delete", "keyvault-secret-get"]
        );
    }

    #[tokio::test]
    async fn test_read_only_is_subset() {
        let all = names(&DirectToolLoader::new(tree(), ServerOptions::default())).await;
        let ro = names(&DirectToolLoader::new(
            tree(),
            ServerOptions::default().with_read_only(true),
        ))
        .await;

        assert!(ro.iter().all(|name| all.contains(name)));
        assert!(!ro.contains(&"storage-account-delete".to_string()));
        assert_eq!(ro.len(), 2);
    }

    #[tokio::test]
    async fn test_namespace_filter() {
        let loader = DirectToolLoader::new(
            tree(),
            ServerOptions::default().with_namespaces(vec!["keyvault".into()]),
        );
        assert_eq!(names(&loader).await, vec!["keyvault-secret-get"]);

        // out-of-namespace tools are not callable either
        let result = loader
            .call_tool(
                CallToolRequest::new("storage-account-delete"),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_call_success() {
        let loader = DirectToolLoader::new(tree(), ServerOptions::default());
        let args = json!({"subscription": "sub1"}).as_object().unwrap().clone();
        let result = loader
            .call_tool(
                CallToolRequest::new("storage-account-list").with_arguments(args),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.text_content().contains("acct1"));
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_error_result() {
        let loader = DirectToolLoader::new(tree(), ServerOptions::default());
        let result = loader
            .call_tool(
                CallToolRequest::new("storage-account-purge"),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("storage-account-purge"));
    }

    #[tokio::test]
    async fn test_call_missing_required_argument() {
        let loader = DirectToolLoader::new(tree(), ServerOptions::default());
        let result = loader
            .call_tool(
                CallToolRequest::new("storage-account-list"),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("missing required option 'subscription'"));
    }

    #[tokio::test]
    async fn test_execution_failure_is_raised() {
        let loader = DirectToolLoader::new(tree(), ServerOptions::default());
        let err = loader
            .call_tool(
                CallToolRequest::new("storage-account-delete"),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LoaderError::Execution {
                tool: "storage-account-delete".into(),
                message: "Execution failed: account is locked".into()
            }
        );
    }

    #[tokio::test]
    async fn test_call_does_not_recheck_read_only() {
        // the read-only call guard lives in the runtime
        let loader = DirectToolLoader::new(tree(), ServerOptions::default().with_read_only(true));
        let err = loader
            .call_tool(
                CallToolRequest::new("storage-account-delete"),
                &NoRequestContext,
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(err, Err(LoaderError::Execution { .. })));
    }
}
