//! Discovery strategy port
//!
//! A strategy enumerates server providers and hands out cached clients.
//! Each strategy holds its own [`ClientCache`] by value and exposes it
//! through [`DiscoveryStrategy::client_cache`]; the provided methods do
//! the lookup and create-once bookkeeping.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolhub_domain::core::string::name_key;
use tracing::debug;

use super::mcp_client::{ClientError, ClientOptions, McpClient};
use super::server_provider::ServerProvider;
use crate::discovery::client_cache::ClientCache;

/// Errors raised by discovery
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Server '{0}' not found")]
    NotFound(String),

    #[error("Failed to connect to server '{server}': {source}")]
    Client {
        server: String,
        #[source]
        source: ClientError,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("A composite discovery strategy needs at least one child strategy")]
    EmptyComposite,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DiscoveryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoveryError::NotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryError::Cancelled)
            || matches!(
                self,
                DiscoveryError::Client {
                    source: ClientError::Cancelled,
                    ..
                }
            )
    }
}

/// Port for enumerating servers
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Enumerate the available servers
    async fn discover(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ServerProvider>>, DiscoveryError>;

    /// Cache of live clients owned by this strategy
    fn client_cache(&self) -> &ClientCache;

    /// Resolve a provider by case-insensitive name
    async fn find_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn ServerProvider>, DiscoveryError> {
        let key = name_key(name);
        self.discover(cancel)
            .await?
            .into_iter()
            .find(|p| name_key(&p.metadata().name) == key)
            .ok_or_else(|| DiscoveryError::NotFound(name.to_string()))
    }

    /// Return the cached client for `name`, creating it on first use.
    ///
    /// At most one client is ever created per name; a failed creation is
    /// not cached.
    async fn get_or_create_client(
        &self,
        name: &str,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, DiscoveryError> {
        self.client_cache()
            .get_or_try_init(name, || async {
                let provider = self.find_by_name(name, cancel).await?;
                debug!(server = %name, "Creating client");
                provider
                    .create_client(options, cancel)
                    .await
                    .map_err(|source| DiscoveryError::Client {
                        server: name.to_string(),
                        source,
                    })
            })
            .await
    }
}
