//! Provider gateway: the single door through which generation requests leave
//! the process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::{ProviderReply, TextProvider};
use crate::error::{Error, ProviderError, Result};
use crate::prompt::PromptPair;
use crate::{llog_debug, llog_trace, llog_warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Wraps a provider with cancellation and a timeout.
///
/// Cancellation abandons the in-flight call: its future is dropped and
/// [`Error::Cancelled`] is returned at once. A timeout surfaces as a
/// transient [`ProviderError`].
#[derive(Clone)]
pub struct ProviderGateway {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn generate(
        &self,
        prompt: &PromptPair,
        cancel: &CancellationToken,
    ) -> Result<ProviderReply> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        llog_debug!(
            "gateway: request provider={} prompt_bytes={}",
            self.provider.name(),
            prompt.len()
        );
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                llog_debug!("gateway: call abandoned after {:?}", started.elapsed());
                return Err(Error::Cancelled);
            }
            outcome = tokio::time::timeout(self.timeout, self.provider.complete(prompt)) => outcome,
        };

        match outcome {
            Err(_) => {
                llog_warn!("gateway: {} timed out after {:?}", self.provider.name(), self.timeout);
                Err(ProviderError::transient(format!("timed out after {:?}", self.timeout)).into())
            }
            Ok(Err(err)) => {
                llog_warn!("gateway: {} failed: {}", self.provider.name(), err);
                Err(err.into())
            }
            Ok(Ok(reply)) => {
                llog_debug!(
                    "gateway: reply in {:?}, tokens={}",
                    started.elapsed(),
                    reply.tokens_used
                );
                llog_trace!("gateway: reply text={}", reply.text);
                if reply.text.trim().is_empty() {
                    return Err(ProviderError::malformed("provider returned empty text").into());
                }
                Ok(reply)
            }
        }
    }
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
