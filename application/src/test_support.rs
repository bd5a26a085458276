//! Hand-written port doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use toolhub_domain::{
    CallToolRequest, CallToolResult, SamplingRequest, ServerMetadata, ToolAnnotations,
    ToolDescriptor,
};

use crate::discovery::client_cache::ClientCache;
use crate::ports::discovery::{DiscoveryError, DiscoveryStrategy};
use crate::ports::mcp_client::{ClientError, ClientOptions, McpClient};
use crate::ports::request_context::{RequestContext, SamplingError};
use crate::ports::server_provider::ServerProvider;
use crate::ports::tool_loader::{LoaderError, ToolLoader};

pub fn tool(name: &str, read_only: bool) -> ToolDescriptor {
    ToolDescriptor::new(name, format!("{} tool", name)).with_annotations(ToolAnnotations {
        read_only_hint: Some(read_only),
        ..Default::default()
    })
}

/// Records calls and returns a canned result
pub struct StubClient {
    pub tools: Vec<ToolDescriptor>,
    pub result: Result<CallToolResult, ClientError>,
    pub calls: Mutex<Vec<(String, Option<Map<String, Value>>)>>,
}

impl StubClient {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            result: Ok(CallToolResult::text("ok")),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, error: ClientError) -> Self {
        self.result = Err(error);
        self
    }

    pub fn call_log(&self) -> Vec<(String, Option<Map<String, Value>>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl McpClient for StubClient {
    async fn list_tools(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, ClientError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        _cancel: &CancellationToken,
    ) -> Result<CallToolResult, ClientError> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        self.result.clone()
    }
}

/// Counts client creations; optionally slow or failing
pub struct CountingProvider {
    pub metadata: ServerMetadata,
    pub client: Arc<StubClient>,
    pub created: Arc<AtomicUsize>,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingProvider {
    pub fn new(name: &str, client: Arc<StubClient>) -> Self {
        Self {
            metadata: ServerMetadata::new(name, name, format!("{} server", name)),
            client,
            created: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerProvider for CountingProvider {
    fn metadata(&self) -> ServerMetadata {
        self.metadata.clone()
    }

    async fn create_client(
        &self,
        _options: &ClientOptions,
        _cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>, ClientError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ClientError::Transport("spawn failed".into()));
        }
        Ok(self.client.clone())
    }
}

/// Fixed provider list with its own client cache
pub struct StubStrategy {
    pub providers: Vec<Arc<CountingProvider>>,
    pub discover_calls: AtomicUsize,
    pub fail: bool,
    cache: ClientCache,
}

impl StubStrategy {
    pub fn new(providers: Vec<Arc<CountingProvider>>) -> Self {
        Self {
            providers,
            discover_calls: AtomicUsize::new(0),
            fail: false,
            cache: ClientCache::new(),
        }
    }

    pub fn failing() -> Self {
        let mut strategy = Self::new(Vec::new());
        strategy.fail = true;
        strategy
    }
}

#[async_trait]
impl DiscoveryStrategy for StubStrategy {
    async fn discover(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ServerProvider>>, DiscoveryError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DiscoveryError::Configuration("registry unreadable".into()));
        }
        Ok(self
            .providers
            .iter()
            .map(|p| p.clone() as Arc<dyn ServerProvider>)
            .collect())
    }

    fn client_cache(&self) -> &ClientCache {
        &self.cache
    }
}

/// Loader exposing fixed tools and echoing its own label on call
pub struct StubLoader {
    pub label: &'static str,
    pub tools: Vec<ToolDescriptor>,
}

#[async_trait]
impl ToolLoader for StubLoader {
    async fn list_tools(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, LoaderError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        request: CallToolRequest,
        _context: &dyn RequestContext,
        _cancel: &CancellationToken,
    ) -> Result<CallToolResult, LoaderError> {
        Ok(CallToolResult::text(format!("{}:{}", self.label, request.name)))
    }
}

/// Scripted sampling answers and a progress log
#[derive(Default)]
pub struct ScriptedContext {
    pub sampling: bool,
    pub answers: Mutex<VecDeque<Result<String, SamplingError>>>,
    pub prompts: Mutex<Vec<SamplingRequest>>,
    pub progress: Mutex<Vec<String>>,
}

impl ScriptedContext {
    pub fn with_answers(answers: Vec<Result<String, SamplingError>>) -> Self {
        Self {
            sampling: true,
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn progress_log(&self) -> Vec<String> {
        self.progress.lock().unwrap().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl RequestContext for ScriptedContext {
    fn supports_sampling(&self) -> bool {
        self.sampling
    }

    async fn sample(
        &self,
        request: SamplingRequest,
        _cancel: &CancellationToken,
    ) -> Result<String, SamplingError> {
        self.prompts.lock().unwrap().push(request);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SamplingError::Failed("no scripted answer".into())))
    }

    async fn notify_progress(&self, message: &str) {
        self.progress.lock().unwrap().push(message.to_string());
    }
}
