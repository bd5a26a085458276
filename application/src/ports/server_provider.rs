//! Server provider port

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolhub_domain::ServerMetadata;

use super::mcp_client::{ClientError, ClientOptions, McpClient};

/// One addressable sub-server.
///
/// Providers are created fresh by each discovery pass and do not own the
/// clients they create; the discovery strategy's cache does.
#[async_trait]
pub trait ServerProvider: Send + Sync {
    fn metadata(&self) -> ServerMetadata;

    /// Connect to the server (spawn a process or open an endpoint)
    async fn create_client(
        &self,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, ClientError>;
}
