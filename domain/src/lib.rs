//! Domain layer for toolhub
//!
//! This crate contains the core types and pure logic. It has no dependencies
//! on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Commands and tools
//!
//! - **Command tree**: hierarchical registry of named operations; each leaf
//!   becomes a tool named by its group path (`storage-account-list`)
//! - **Tool descriptor**: name, input schema and capability hints advertised
//!   to the protocol caller
//!
//! ## Servers
//!
//! - **Server metadata**: the routing key of a sub-server (a command group
//!   re-executed as a child process, or a registry entry)
//! - **Registry document**: static list of remote servers reached over stdio
//!   or HTTP
//!
//! ## Intent
//!
//! - **Gateway**: one meta-tool implementing learn → command navigation,
//!   optionally shortcut by asking the caller's model (sampling)

pub mod command;
pub mod core;
pub mod intent;
pub mod server;
pub mod tool;

// Re-export commonly used types
pub use command::{
    BindingIssue, BoundArguments, Command, CommandContext, CommandError, CommandGroup,
    CommandMetadata, CommandResponse, CommandTree, OptionSpec, ValueType, bind_arguments,
};
pub use core::error::DomainError;
pub use intent::{IntentMode, IntentRequest, SamplingRequest};
pub use server::{RegistryDocument, RegistryServerEntry, ServerMetadata, TransportConfig};
pub use tool::{
    CallToolRequest, CallToolResult, ContentBlock, ToolAnnotations, ToolDescriptor, ToolError,
};
