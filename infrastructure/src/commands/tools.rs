//! Built-in `tools` group: `tools list`

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use toolhub_domain::core::string::in_namespace;
use toolhub_domain::{
    BoundArguments, Command, CommandContext, CommandError, CommandMetadata, CommandResponse,
    CommandTree, OptionSpec,
};
use tracing::debug;

/// Name of the built-in group
pub const TOOLS_GROUP: &str = "tools";

/// Catalog entry returned by `tools list`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSummary {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
    pub read_only: bool,
}

/// Lists every visible command of the tree it belongs to.
///
/// The tree is attached after construction because the command is itself
/// part of the tree it lists.
pub struct ToolsListCommand {
    tree: Arc<OnceLock<Weak<CommandTree>>>,
}

impl ToolsListCommand {
    pub(crate) fn new(tree: Arc<OnceLock<Weak<CommandTree>>>) -> Self {
        Self { tree }
    }
}

/// Visible commands of `tree`, optionally limited to one top-level group
pub fn summarize(tree: &CommandTree, namespace: Option<&str>) -> Vec<CommandSummary> {
    tree.visible_commands()
        .filter(|(name, _)| namespace.is_none_or(|ns| in_namespace(name, ns)))
        .map(|(name, cmd)| CommandSummary {
            name: name.to_string(),
            description: cmd.description().to_string(),
            options: cmd.options(),
            read_only: cmd.metadata().read_only,
        })
        .collect()
}

#[async_trait]
impl Command for ToolsListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List every available command with its description and options."
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::read_only()
            .with_title("List commands")
            .with_open_world(false)
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::new(
            "namespace",
            "Only list commands of this top-level group",
            false,
        )]
    }

    async fn execute(
        &self,
        _context: &CommandContext,
        args: &BoundArguments,
    ) -> Result<CommandResponse, CommandError> {
        let tree = self
            .tree
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| CommandError::Failed("Command tree is not available".to_string()))?;

        let commands = summarize(&tree, args.get_string("namespace"));
        debug!(command = "tools-list", count = commands.len(), "Listed commands");
        Ok(CommandResponse::ok(json!({ "commands": commands })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_command_tree;
    use toolhub_domain::CommandGroup;

    struct Fixed {
        name: &'static str,
        read_only: bool,
        hidden: bool,
    }

    #[async_trait]
    impl Command for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "fixed"
        }
        fn metadata(&self) -> CommandMetadata {
            if self.read_only {
                CommandMetadata::read_only()
            } else {
                CommandMetadata::default()
            }
        }
        fn options(&self) -> Vec<OptionSpec> {
            vec![OptionSpec::new("account", "Account name", true)]
        }
        fn hidden(&self) -> bool {
            self.hidden
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            _args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            Ok(CommandResponse::ok(json!(null)))
        }
    }

    fn groups() -> Vec<CommandGroup> {
        vec![
            CommandGroup::new("storage", "Storage")
                .with_command(Fixed { name: "list", read_only: true, hidden: false })
                .with_command(Fixed { name: "delete", read_only: false, hidden: false })
                .with_command(Fixed { name: "debug", read_only: true, hidden: true }),
            CommandGroup::new("keyvault", "Key Vault")
                .with_command(Fixed { name: "get", read_only: true, hidden: false }),
        ]
    }

    async fn run(tree: &CommandTree, args: BoundArguments) -> Vec<serde_json::Value> {
        let command = tree.find("tools-list").unwrap();
        let response = command.execute(&CommandContext::default(), &args).await.unwrap();
        response.results.unwrap()["commands"]
            .as_array()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_lists_visible_commands_including_itself() {
        let tree = build_command_tree(groups()).unwrap();
        let commands = run(&tree, BoundArguments::new()).await;
        let names: Vec<&str> = commands.iter().filter_map(|c| c["name"].as_str()).collect();
        assert_eq!(
            names,
            vec!["storage-list", "storage-delete", "keyvault-get", "tools-list"]
        );

        let delete = &commands[1];
        assert_eq!(delete["readOnly"], json!(false));
        assert_eq!(delete["options"][0]["name"], json!("account"));
    }

    #[tokio::test]
    async fn test_namespace_filter_is_case_insensitive() {
        let tree = build_command_tree(groups()).unwrap();
        let commands = run(&tree, BoundArguments::new().with_value("namespace", "KeyVault")).await;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["name"], json!("keyvault-get"));
    }

    #[tokio::test]
    async fn test_detached_command_fails() {
        let command = ToolsListCommand::new(Arc::new(OnceLock::new()));
        let err = command
            .execute(&CommandContext::default(), &BoundArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Failed(_)));
    }

    #[test]
    fn test_is_read_only() {
        let command = ToolsListCommand::new(Arc::new(OnceLock::new()));
        assert!(command.metadata().read_only);
        assert!(!command.metadata().destructive);
    }
}
