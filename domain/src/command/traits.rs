//! The command contract consumed by the tool loaders.

use async_trait::async_trait;
use thiserror::Error;

use super::entities::{BoundArguments, CommandContext, CommandMetadata, CommandResponse, OptionSpec};

/// Error raised by a command while executing
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("Command cancelled")]
    Cancelled,
}

/// A single named operation of the command tree.
///
/// Implementations live outside the core; the loaders only see this trait.
#[async_trait]
pub trait Command: Send + Sync {
    /// Leaf name inside its group (e.g. `list`)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Capability flags and title
    fn metadata(&self) -> CommandMetadata;

    /// Declared options
    fn options(&self) -> Vec<OptionSpec>;

    /// Hidden commands are executable but never listed
    fn hidden(&self) -> bool {
        false
    }

    /// Execute the command with already-bound arguments
    async fn execute(
        &self,
        context: &CommandContext,
        args: &BoundArguments,
    ) -> Result<CommandResponse, CommandError>;
}
