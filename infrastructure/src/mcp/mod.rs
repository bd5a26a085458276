//! MCP adapters: newline-delimited JSON-RPC over stdio, plus HTTP.
//!
//! - [`router`]: request/response correlation on one connection
//! - [`stdio_client`] / [`http_client`]: [`McpClient`](toolhub_application::McpClient)
//!   implementations for child processes and remote endpoints
//! - [`server`]: serves a [`ToolRuntime`](toolhub_application::ToolRuntime)
//!   to an MCP client

mod client;
pub mod error;
pub mod http_client;
pub mod protocol;
pub mod router;
pub mod server;
pub mod stdio_client;

pub use error::{McpError, Result};
pub use http_client::HttpMcpClient;
pub use router::{Incoming, MessageRouter};
pub use server::McpServer;
pub use stdio_client::{StdioLaunch, StdioMcpClient};
