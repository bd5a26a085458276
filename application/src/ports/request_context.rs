//! Request context port
//!
//! Per-call access to the calling transport: LLM sampling and progress
//! notifications. Both are optional capabilities of the caller.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolhub_domain::SamplingRequest;

/// Errors raised by a sampling round-trip
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    #[error("The caller does not support sampling")]
    NotSupported,

    #[error("Sampling failed: {0}")]
    Failed(String),

    #[error("Sampling cancelled")]
    Cancelled,
}

/// Port for talking back to the caller of the current request
#[async_trait]
pub trait RequestContext: Send + Sync {
    /// Whether the caller advertised LLM sampling
    fn supports_sampling(&self) -> bool;

    /// Ask the caller's model a single question and return its text answer
    async fn sample(
        &self,
        request: SamplingRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SamplingError>;

    /// Report progress on the current call
    async fn notify_progress(&self, message: &str);
}

/// Context for callers without sampling or progress support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRequestContext;

#[async_trait]
impl RequestContext for NoRequestContext {
    fn supports_sampling(&self) -> bool {
        false
    }

    async fn sample(
        &self,
        _request: SamplingRequest,
        _cancel: &CancellationToken,
    ) -> Result<String, SamplingError> {
        Err(SamplingError::NotSupported)
    }

    async fn notify_progress(&self, _message: &str) {}
}
