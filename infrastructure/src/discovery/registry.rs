//! Discovery of servers listed in a registry document.
//!
//! The document is read and parsed once, on first use. Entries are checked
//! lazily: a malformed entry is still listed, and only creating a client
//! for it fails with a configuration error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolhub_application::{
    ClientCache, DiscoveryError, DiscoveryStrategy, OnceSlot, ServerProvider,
};
use toolhub_domain::{RegistryDocument, TransportConfig};
use tracing::{debug, warn};

use super::providers::{HttpServerProvider, MisconfiguredServerProvider, StdioServerProvider};
use crate::mcp::StdioLaunch;

enum RegistrySource {
    File(PathBuf),
    Inline(String),
}

pub struct RegistryDiscoveryStrategy {
    source: RegistrySource,
    namespaces: Option<Vec<String>>,
    document: OnceSlot<Arc<RegistryDocument>>,
    cache: ClientCache,
}

impl RegistryDiscoveryStrategy {
    /// Registry read from a JSON file
    pub fn from_path(path: impl Into<PathBuf>, namespaces: Option<Vec<String>>) -> Self {
        Self::with_source(RegistrySource::File(path.into()), namespaces)
    }

    /// Registry given as JSON text
    pub fn from_json(text: impl Into<String>, namespaces: Option<Vec<String>>) -> Self {
        Self::with_source(RegistrySource::Inline(text.into()), namespaces)
    }

    fn with_source(source: RegistrySource, namespaces: Option<Vec<String>>) -> Self {
        Self {
            source,
            namespaces,
            document: OnceSlot::new(),
            cache: ClientCache::new(),
        }
    }

    /// The parsed document, loaded on first call
    pub async fn document(&self) -> Result<Arc<RegistryDocument>, DiscoveryError> {
        self.document
            .get_or_try_init(|| async {
                let (origin, text) = match &self.source {
                    RegistrySource::File(path) => {
                        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                            DiscoveryError::Configuration(format!(
                                "Cannot read registry '{}': {}",
                                path.display(),
                                e
                            ))
                        })?;
                        (path.display().to_string(), text)
                    }
                    RegistrySource::Inline(text) => ("<inline>".to_string(), text.clone()),
                };

                let document = RegistryDocument::from_json(&text).map_err(|e| {
                    DiscoveryError::Configuration(format!(
                        "Invalid registry '{}': {}",
                        origin, e
                    ))
                })?;
                debug!(registry = %origin, servers = document.servers.len(), "Loaded registry");
                Ok(Arc::new(document))
            })
            .await
    }
}

#[async_trait]
impl DiscoveryStrategy for RegistryDiscoveryStrategy {
    async fn discover(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ServerProvider>>, DiscoveryError> {
        let document = self.document().await?;

        let providers: Vec<Arc<dyn ServerProvider>> = document
            .entries(self.namespaces.as_deref())
            .map(|(id, entry)| {
                let metadata = entry.metadata(id);
                let provider: Arc<dyn ServerProvider> = match entry.transport(id) {
                    Ok(TransportConfig::Stdio { command, args, env }) => {
                        Arc::new(StdioServerProvider::new(
                            metadata,
                            stdio_launch(command, args, env),
                        ))
                    }
                    Ok(TransportConfig::Http { url }) => {
                        Arc::new(HttpServerProvider::new(metadata, url))
                    }
                    Err(e) => {
                        warn!(server = %id, error = %e, "Registry entry is misconfigured");
                        Arc::new(MisconfiguredServerProvider::new(metadata, e.to_string()))
                    }
                };
                provider
            })
            .collect();

        debug!(count = providers.len(), "Discovered registry servers");
        Ok(providers)
    }

    fn client_cache(&self) -> &ClientCache {
        &self.cache
    }
}

/// The child inherits our environment; only the entry's variables are
/// carried, and they win on collision.
fn stdio_launch(command: String, args: Vec<String>, env: HashMap<String, String>) -> StdioLaunch {
    StdioLaunch::new(command, args).with_env(env)
}
