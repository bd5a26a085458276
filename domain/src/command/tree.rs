//! Hierarchical command registry
//!
//! ```text
//! root
//! ├── storage                  (group  = namespace / sub-server)
//! │   └── account              (group)
//! │       └── list             (command → "storage-account-list")
//! └── tools
//!     └── list                 (command → "tools-list")
//! ```
//!
//! Fully-qualified names join the group path and the command name with `-`.
//! The root group's own name is not part of the path.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::Command;
use crate::core::error::DomainError;
use crate::core::string::name_key;

/// Separator between path segments of a fully-qualified command name
pub const NAME_SEPARATOR: char = '-';

/// A named group of commands and sub-groups
#[derive(Clone)]
pub struct CommandGroup {
    pub name: String,
    pub description: String,
    pub subgroups: Vec<CommandGroup>,
    pub commands: Vec<Arc<dyn Command>>,
}

impl CommandGroup {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subgroups: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: CommandGroup) -> Self {
        self.subgroups.push(group);
        self
    }

    pub fn with_command<C: Command + 'static>(mut self, command: C) -> Self {
        self.commands.push(Arc::new(command));
        self
    }

    pub fn with_command_arc(mut self, command: Arc<dyn Command>) -> Self {
        self.commands.push(command);
        self
    }
}

impl std::fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGroup")
            .field("name", &self.name)
            .field("subgroups", &self.subgroups)
            .field(
                "commands",
                &self.commands.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// An indexed, validated command tree
#[derive(Clone)]
pub struct CommandTree {
    root: CommandGroup,
    /// Fully-qualified name → command, in tree order
    entries: Vec<(String, Arc<dyn Command>)>,
    index: HashMap<String, usize>,
}

impl CommandTree {
    /// Build the tree index, rejecting invalid or duplicate names.
    pub fn new(root: CommandGroup) -> Result<Self, DomainError> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        let mut seen_groups = std::collections::HashSet::new();
        for group in &root.subgroups {
            if !seen_groups.insert(name_key(&group.name)) {
                return Err(DomainError::DuplicateGroup(group.name.clone()));
            }
        }

        for command in &root.commands {
            Self::index_command(&mut entries, &mut index, "", command)?;
        }
        for group in &root.subgroups {
            Self::index_group(&mut entries, &mut index, "", group)?;
        }

        Ok(Self {
            root,
            entries,
            index,
        })
    }

    fn index_group(
        entries: &mut Vec<(String, Arc<dyn Command>)>,
        index: &mut HashMap<String, usize>,
        prefix: &str,
        group: &CommandGroup,
    ) -> Result<(), DomainError> {
        validate_segment(&group.name)?;
        let path = join(prefix, &group.name);

        for command in &group.commands {
            Self::index_command(entries, index, &path, command)?;
        }
        for sub in &group.subgroups {
            Self::index_group(entries, index, &path, sub)?;
        }
        Ok(())
    }

    fn index_command(
        entries: &mut Vec<(String, Arc<dyn Command>)>,
        index: &mut HashMap<String, usize>,
        prefix: &str,
        command: &Arc<dyn Command>,
    ) -> Result<(), DomainError> {
        validate_segment(command.name())?;
        let full_name = join(prefix, command.name());
        if index.contains_key(&full_name) {
            return Err(DomainError::DuplicateCommand(full_name));
        }
        index.insert(full_name.clone(), entries.len());
        entries.push((full_name, Arc::clone(command)));
        Ok(())
    }

    /// Top-level groups (the candidate namespaces)
    pub fn groups(&self) -> &[CommandGroup] {
        &self.root.subgroups
    }

    /// Find a top-level group by case-insensitive name
    pub fn group(&self, name: &str) -> Option<&CommandGroup> {
        let key = name_key(name);
        self.root.subgroups.iter().find(|g| name_key(&g.name) == key)
    }

    /// All commands with their fully-qualified names, hidden ones included
    pub fn all_commands(&self) -> impl Iterator<Item = (&str, &Arc<dyn Command>)> {
        self.entries.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Commands that should appear in tool listings
    pub fn visible_commands(&self) -> impl Iterator<Item = (&str, &Arc<dyn Command>)> {
        self.all_commands().filter(|(_, cmd)| !cmd.hidden())
    }

    /// Look up a command by exact fully-qualified name
    pub fn find(&self, full_name: &str) -> Option<&Arc<dyn Command>> {
        self.index.get(full_name).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("commands", &self.entries.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

fn validate_segment(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() || name.contains(NAME_SEPARATOR) {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, NAME_SEPARATOR, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::entities::{
        BoundArguments, CommandContext, CommandMetadata, CommandResponse, OptionSpec,
    };
    use crate::command::traits::CommandError;
    use async_trait::async_trait;

    struct StubCommand {
        name: &'static str,
        hidden: bool,
    }

    #[async_trait]
    impl Command for StubCommand {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::read_only()
        }
        fn options(&self) -> Vec<OptionSpec> {
            Vec::new()
        }
        fn hidden(&self) -> bool {
            self.hidden
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            _args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            Ok(CommandResponse::ok(serde_json::json!(self.name)))
        }
    }

    fn stub(name: &'static str) -> StubCommand {
        StubCommand {
            name,
            hidden: false,
        }
    }

    fn sample_root() -> CommandGroup {
        CommandGroup::new("root", "root")
            .with_group(
                CommandGroup::new("storage", "Storage operations").with_group(
                    CommandGroup::new("account", "Accounts")
                        .with_command(stub("list"))
                        .with_command(StubCommand {
                            name: "purge",
                            hidden: true,
                        }),
                ),
            )
            .with_group(CommandGroup::new("keyvault", "Key Vault").with_command(stub("list")))
    }

    #[test]
    fn test_fully_qualified_names() {
        let tree = CommandTree::new(sample_root()).unwrap();
        let names: Vec<&str> = tree.all_commands().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["storage-account-list", "storage-account-purge", "keyvault-list"]
        );
        assert_eq!(tree.len(), 3);
        assert!(tree.find("storage-account-list").is_some());
        assert!(tree.find("storage-account").is_none());
    }

    #[tokio::test]
    async fn test_found_command_executes() {
        let tree = CommandTree::new(sample_root()).unwrap();
        let command = tree.find("keyvault-list").unwrap();
        let context = CommandContext::new(tokio_util::sync::CancellationToken::new());
        let response = command
            .execute(&context, &BoundArguments::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.results, Some(serde_json::json!("list")));
    }

    #[test]
    fn test_hidden_commands_not_visible() {
        let tree = CommandTree::new(sample_root()).unwrap();
        let visible: Vec<&str> = tree.visible_commands().map(|(n, _)| n).collect();
        assert!(!visible.contains(&"storage-account-purge"));
        // still executable by name
        assert!(tree.find("storage-account-purge").is_some());
    }

    #[test]
    fn test_group_lookup_is_case_insensitive() {
        let tree = CommandTree::new(sample_root()).unwrap();
        assert_eq!(tree.group("STORAGE").unwrap().name, "storage");
        assert!(tree.group("compute").is_none());
        assert_eq!(tree.groups().len(), 2);
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let root = CommandGroup::new("root", "root")
            .with_group(CommandGroup::new("storage", "a"))
            .with_group(CommandGroup::new("Storage", "b"));
        assert_eq!(
            CommandTree::new(root).unwrap_err(),
            DomainError::DuplicateGroup("Storage".into())
        );
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let root = CommandGroup::new("root", "root").with_group(
            CommandGroup::new("storage", "a")
                .with_command(stub("list"))
                .with_command(stub("list")),
        );
        assert_eq!(
            CommandTree::new(root).unwrap_err(),
            DomainError::DuplicateCommand("storage-list".into())
        );
    }

    #[test]
    fn test_separator_in_segment_rejected() {
        let root = CommandGroup::new("root", "root")
            .with_group(CommandGroup::new("storage-sync", "a").with_command(stub("list")));
        assert!(matches!(
            CommandTree::new(root),
            Err(DomainError::InvalidName(_))
        ));
    }
}
