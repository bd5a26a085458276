//! Server providers backed by real transports

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolhub_application::{ClientError, ClientOptions, McpClient, ServerProvider};
use toolhub_domain::ServerMetadata;

use crate::mcp::{HttpMcpClient, StdioLaunch, StdioMcpClient};

/// A server run as a child process speaking MCP on stdio
pub struct StdioServerProvider {
    metadata: ServerMetadata,
    launch: StdioLaunch,
}

impl StdioServerProvider {
    pub fn new(metadata: ServerMetadata, launch: StdioLaunch) -> Self {
        Self { metadata, launch }
    }

    pub fn launch(&self) -> &StdioLaunch {
        &self.launch
    }
}

#[async_trait]
impl ServerProvider for StdioServerProvider {
    fn metadata(&self) -> ServerMetadata {
        self.metadata.clone()
    }

    async fn create_client(
        &self,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, ClientError> {
        let client = StdioMcpClient::spawn(&self.metadata.name, &self.launch, options, cancel).await?;
        Ok(Arc::new(client))
    }
}

/// A remote server reached over HTTP
pub struct HttpServerProvider {
    metadata: ServerMetadata,
    url: String,
}

impl HttpServerProvider {
    pub fn new(metadata: ServerMetadata, url: impl Into<String>) -> Self {
        Self {
            metadata,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ServerProvider for HttpServerProvider {
    fn metadata(&self) -> ServerMetadata {
        self.metadata.clone()
    }

    async fn create_client(
        &self,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, ClientError> {
        let client = HttpMcpClient::connect(&self.metadata.name, &self.url, options, cancel).await?;
        Ok(Arc::new(client))
    }
}

/// A listed server whose entry cannot be connected to.
///
/// It still shows up in discovery; creating a client reports why.
pub struct MisconfiguredServerProvider {
    metadata: ServerMetadata,
    reason: String,
}

impl MisconfiguredServerProvider {
    pub fn new(metadata: ServerMetadata, reason: impl Into<String>) -> Self {
        Self {
            metadata,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ServerProvider for MisconfiguredServerProvider {
    fn metadata(&self) -> ServerMetadata {
        self.metadata.clone()
    }

    async fn create_client(
        &self,
        _options: &ClientOptions,
        _cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, ClientError> {
        Err(ClientError::Configuration(self.reason.clone()))
    }
}
