//! Application layer for toolhub
//!
//! This crate contains the ports, discovery building blocks, tool loaders
//! and the runtime that serves them. It depends only on the domain layer.

pub mod config;
pub mod discovery;
pub mod loaders;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ServerMode, ServerOptions};
pub use discovery::{ClientCache, CompositeDiscoveryStrategy, OnceMap, OnceSlot};
pub use loaders::{CompositeToolLoader, DirectToolLoader, ProxyToolLoader, SingleToolLoader};
pub use ports::{
    discovery::{DiscoveryError, DiscoveryStrategy},
    mcp_client::{ClientError, ClientOptions, McpClient},
    request_context::{NoRequestContext, RequestContext, SamplingError},
    server_provider::ServerProvider,
    tool_loader::{LoaderError, ToolLoader},
};
pub use use_cases::tool_runtime::ToolRuntime;
