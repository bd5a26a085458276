//! Create-once caches keyed by server name.
//!
//! Each key owns a [`tokio::sync::OnceCell`]. Concurrent first accesses to
//! one key run a single initializer while the others wait on the cell; a
//! failed or cancelled initializer leaves the cell empty so the next caller
//! retries. Values are only stored once fully constructed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use toolhub_domain::core::string::name_key;

use crate::ports::mcp_client::McpClient;

/// Case-insensitive map of lazily initialized values
pub struct OnceMap<V> {
    cells: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

/// Server name → live client
pub type ClientCache = OnceMap<Arc<dyn McpClient>>;

impl<V> Default for OnceMap<V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> OnceMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `init` if it is not set yet.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(name_key(key)).or_default())
        };
        cell.get_or_try_init(init).await.cloned()
    }

    /// Value for `key` if it has been initialized
    pub async fn get(&self, key: &str) -> Option<V> {
        let cells = self.cells.lock().await;
        cells.get(&name_key(key)).and_then(|cell| cell.get().cloned())
    }

    /// Number of initialized entries
    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry. In-flight initializers finish into detached cells.
    pub async fn clear(&self) {
        self.cells.lock().await.clear();
    }
}

/// A single resettable create-once value
pub struct OnceSlot<V> {
    cell: Mutex<Arc<OnceCell<V>>>,
}

impl<V> Default for OnceSlot<V> {
    fn default() -> Self {
        Self {
            cell: Mutex::new(Arc::new(OnceCell::new())),
        }
    }
}

impl<V: Clone> OnceSlot<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = Arc::clone(&*self.cell.lock().await);
        cell.get_or_try_init(init).await.cloned()
    }

    pub async fn reset(&self) {
        *self.cell.lock().await = Arc::new(OnceCell::new());
    }
}
