//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod discovery;
pub mod mcp_client;
pub mod request_context;
pub mod server_provider;
pub mod tool_loader;
