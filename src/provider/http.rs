//! OpenAI-compatible chat-completions provider.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{ProviderReply, TextProvider};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::llog_debug;
use crate::prompt::PromptPair;

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// Talks to any server exposing `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Build from configuration. The API key is read from the environment
    /// variable the config names; a missing key is allowed for local servers.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = std::env::var(config.effective_api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            llog_debug!(
                "openai: {} is not set, sending requests without a key",
                config.effective_api_key_env()
            );
        }
        Ok(Self {
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::new(config.effective_base_url(), config.effective_model())
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, prompt: &PromptPair) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "stream": false
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }

    fn parse_body(body: &str) -> std::result::Result<ProviderReply, ProviderError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::malformed(format!("unparseable response body: {}", e)))?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::malformed("response has no choices"))?;
        let tokens_used = response.usage.map(|u| u.total_tokens).unwrap_or(0);
        Ok(ProviderReply::new(text.trim(), tokens_used))
    }
}

/// Map an HTTP status to a provider failure class.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = format!("HTTP {}: {}", status, body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::auth(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::transient(message)
        }
        s if s.is_server_error() => ProviderError::transient(message),
        _ => ProviderError::malformed(message),
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<ProviderReply, ProviderError> {
        let url = self.endpoint();
        llog_debug!("openai: POST {} model={}", url, self.model);

        let mut request = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transient(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }
        Self::parse_body(&body)
    }
}
