//! Infrastructure layer for toolhub
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: MCP transports, discovery strategies,
//! the stdio MCP server, built-in commands and configuration file loading.

pub mod commands;
pub mod config;
pub mod discovery;
pub mod mcp;

// Re-export commonly used types
pub use commands::{ToolsListCommand, build_command_tree};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use discovery::{
    CommandGroupDiscoveryStrategy, HttpServerProvider, RegistryDiscoveryStrategy,
    StdioServerProvider,
};
pub use mcp::{HttpMcpClient, McpError, McpServer, StdioLaunch, StdioMcpClient};
