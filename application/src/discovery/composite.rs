//! Composite discovery: several strategies behind one.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use toolhub_domain::server::duplicate_names;
use tracing::warn;

use super::client_cache::ClientCache;
use crate::ports::discovery::{DiscoveryError, DiscoveryStrategy};
use crate::ports::server_provider::ServerProvider;

/// Runs every child strategy concurrently and concatenates the results.
///
/// A failing child is logged and skipped. Duplicate server names are
/// logged and kept; name lookups resolve to the first match.
pub struct CompositeDiscoveryStrategy {
    strategies: Vec<Arc<dyn DiscoveryStrategy>>,
    cache: ClientCache,
}

impl CompositeDiscoveryStrategy {
    pub fn new(strategies: Vec<Arc<dyn DiscoveryStrategy>>) -> Result<Self, DiscoveryError> {
        if strategies.is_empty() {
            return Err(DiscoveryError::EmptyComposite);
        }
        Ok(Self {
            strategies,
            cache: ClientCache::new(),
        })
    }
}

#[async_trait]
impl DiscoveryStrategy for CompositeDiscoveryStrategy {
    async fn discover(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ServerProvider>>, DiscoveryError> {
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
            results = join_all(self.strategies.iter().map(|s| s.discover(cancel))) => results,
        };

        let mut providers = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(found) => providers.extend(found),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(strategy = index, error = %e, "Discovery strategy failed, skipping"),
            }
        }

        let metadata: Vec<_> = providers.iter().map(|p| p.metadata()).collect();
        for name in duplicate_names(&metadata) {
            warn!(server = %name, "Server name discovered more than once; lookups use the first");
        }

        Ok(providers)
    }

    fn client_cache(&self) -> &ClientCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mcp_client::ClientOptions;
    use crate::test_support::{CountingProvider, StubClient, StubStrategy};
    use std::time::Duration;

    fn provider(name: &str) -> Arc<CountingProvider> {
        Arc::new(CountingProvider::new(name, Arc::new(StubClient::new(vec![]))))
    }

    #[test]
    fn test_empty_composite_rejected() {
        assert!(matches!(
            CompositeDiscoveryStrategy::new(vec![]),
            Err(DiscoveryError::EmptyComposite)
        ));
    }

    #[tokio::test]
    async fn test_discover_concatenates_children() {
        let composite = CompositeDiscoveryStrategy::new(vec![
            Arc::new(StubStrategy::new(vec![provider("storage"), provider("keyvault")])),
            Arc::new(StubStrategy::new(vec![provider("docs")])),
        ])
        .unwrap();

        let names: Vec<String> = composite
            .discover(&CancellationToken::new())
            .await
            .unwrap()
            .iter()
            .map(|p| p.metadata().name)
            .collect();
        assert_eq!(names, vec!["storage", "keyvault", "docs"]);
    }

    #[tokio::test]
    async fn test_failing_child_does_not_abort_siblings() {
        let composite = CompositeDiscoveryStrategy::new(vec![
            Arc::new(StubStrategy::failing()),
            Arc::new(StubStrategy::new(vec![provider("docs")])),
        ])
        .unwrap();

        let found = composite.discover(&CancellationToken::new()).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name_unknown_is_not_found() {
        let composite =
            CompositeDiscoveryStrategy::new(vec![Arc::new(StubStrategy::new(vec![provider(
                "storage",
            )]))])
            .unwrap();

        let err = composite
            .find_by_name("compute", &CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert_eq!(err, DiscoveryError::NotFound("compute".into()));

        let found = composite
            .find_by_name("STORAGE", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(found.metadata().name, "storage");
    }

    #[tokio::test]
    async fn test_duplicate_names_are_kept() {
        // ambiguity: both entries survive discovery, lookups pick the first
        let first = provider("docs");
        let composite = CompositeDiscoveryStrategy::new(vec![
            Arc::new(StubStrategy::new(vec![first.clone()])),
            Arc::new(StubStrategy::new(vec![provider("Docs")])),
        ])
        .unwrap();

        let cancel = CancellationToken::new();
        assert_eq!(composite.discover(&cancel).await.unwrap().len(), 2);
        composite
            .get_or_create_client("docs", &ClientOptions::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(first.created(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_client_creates_once() {
        let mut slow = CountingProvider::new("storage", Arc::new(StubClient::new(vec![])));
        slow.delay = Duration::from_millis(50);
        let slow = Arc::new(slow);

        let composite = Arc::new(
            CompositeDiscoveryStrategy::new(vec![Arc::new(StubStrategy::new(vec![
                slow.clone(),
            ]))])
            .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..10 {
            let composite = Arc::clone(&composite);
            handles.push(tokio::spawn(async move {
                composite
                    .get_or_create_client("storage", &ClientOptions::default(), &CancellationToken::new())
                    .await
                    .unwrap()
            }));
        }
        let clients: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(slow.created(), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    }

    #[tokio::test]
    async fn test_failed_client_creation_is_retried() {
        let mut failing = CountingProvider::new("docs", Arc::new(StubClient::new(vec![])));
        failing.fail = true;
        let failing = Arc::new(failing);
        let composite =
            CompositeDiscoveryStrategy::new(vec![Arc::new(StubStrategy::new(vec![
                failing.clone(),
            ]))])
            .unwrap();

        let cancel = CancellationToken::new();
        let options = ClientOptions::default();
        for _ in 0..2 {
            let err = composite
                .get_or_create_client("docs", &options, &cancel)
                .await
                .err()
                .unwrap();
            assert!(matches!(err, DiscoveryError::Client { .. }));
        }
        assert_eq!(failing.created(), 2);
        assert!(composite.client_cache().is_empty().await);
    }
}
