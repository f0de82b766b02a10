//! Text-generation providers.
//!
//! Every backend implements [`TextProvider`]: one system/user prompt pair in,
//! one text reply with token usage out, failures classified as
//! [`ProviderError`]. The orchestrator only ever talks to a
//! [`ProviderGateway`], which adds cancellation and timeouts on top of
//! whichever provider is configured.

mod gateway;
mod headless;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::prompt::PromptPair;

pub use gateway::ProviderGateway;
pub use headless::HeadlessProvider;
pub use http::OpenAiCompatibleProvider;

/// A single completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderReply {
    pub text: String,
    pub tokens_used: u64,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            text: text.into(),
            tokens_used,
        }
    }
}

/// The contract every text-generation backend satisfies.
///
/// Implementations must not retry on their own; the word-count loop owns the
/// retry budget.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short name for logs, e.g. "headless" or "openai".
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<ProviderReply, ProviderError>;
}

/// Build the provider named in the configuration.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn TextProvider>> {
    match config.kind {
        ProviderKind::Headless => Ok(Arc::new(HeadlessProvider::from_config(config)?)),
        ProviderKind::Openai => Ok(Arc::new(OpenAiCompatibleProvider::from_config(config)?)),
    }
}

/// Build a gateway around the configured provider.
pub fn build_gateway(config: &ProviderConfig) -> Result<ProviderGateway> {
    Ok(ProviderGateway::new(build_provider(config)?).with_timeout(config.timeout()))
}
