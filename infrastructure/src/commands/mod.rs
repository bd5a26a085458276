//! Built-in commands and command tree assembly
//!
//! The embedding program supplies its own top-level groups; the hub adds
//! the reserved `tools` group on top.

pub mod tools;

use std::sync::{Arc, OnceLock};

use toolhub_domain::{CommandGroup, CommandTree, DomainError};

pub use tools::{CommandSummary, TOOLS_GROUP, ToolsListCommand, summarize};

/// Build the command tree from `groups` plus the built-in `tools` group.
pub fn build_command_tree(groups: Vec<CommandGroup>) -> Result<Arc<CommandTree>, DomainError> {
    let slot = Arc::new(OnceLock::new());

    let mut root = CommandGroup::new("root", "toolhub commands");
    for group in groups {
        root = root.with_group(group);
    }
    root = root.with_group(
        CommandGroup::new(TOOLS_GROUP, "Inspect the available commands")
            .with_command(ToolsListCommand::new(Arc::clone(&slot))),
    );

    let tree = Arc::new(CommandTree::new(root)?);
    let _ = slot.set(Arc::downgrade(&tree));
    Ok(tree)
}
