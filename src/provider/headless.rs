//! Headless CLI provider.
//!
//! Runs a local model CLI in print mode (`-p`) with JSON output and turns
//! its single JSON result object into a [`ProviderReply`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{ProviderReply, TextProvider};
use crate::config::ProviderConfig;
use crate::error::{Error, ProviderError, ProviderErrorKind, Result};
use crate::llog_debug;
use crate::prompt::PromptPair;

/// Markers in CLI error output that mean the user is not signed in.
const AUTH_MARKERS: [&str; 5] = [
    "invalid api key",
    "not logged in",
    "please run /login",
    "authentication",
    "unauthorized",
];

#[derive(Debug, Deserialize, Default)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
}

/// The CLI's JSON result object. Only the fields we use.
#[derive(Debug, Deserialize)]
struct RawCliResponse {
    subtype: Option<String>,
    #[serde(default)]
    is_error: bool,
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    usage: Option<RawUsage>,
}

/// Provider backed by a local model CLI.
#[derive(Debug, Clone)]
pub struct HeadlessProvider {
    binary: PathBuf,
    model: Option<String>,
}

impl HeadlessProvider {
    /// Locate `binary` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] if the binary cannot be found.
    pub fn locate(binary: &str) -> Result<Self> {
        let path = which::which(binary)
            .map_err(|_| Error::ProviderUnavailable(format!("'{}' not found on PATH", binary)))?;
        Ok(Self::with_binary(path))
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let mut provider = Self::locate(config.effective_binary())?;
        provider.model = config.model.clone();
        Ok(provider)
    }

    /// Use a specific binary path without looking it up.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self {
            binary,
            model: None,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn args(&self, prompt: &PromptPair) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.user.clone(),
            "--system-prompt".to_string(),
            prompt.system.clone(),
            "--output-format".to_string(),
            "json".to_string(),
        ];
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args
    }

    /// Parse the CLI's JSON output.
    pub fn parse_output(stdout: &str) -> std::result::Result<ProviderReply, ProviderError> {
        let raw: RawCliResponse = serde_json::from_str(stdout.trim()).map_err(|e| {
            ProviderError::malformed(format!("CLI output is not a JSON result: {}", e))
        })?;

        let failed = raw.is_error || raw.subtype.as_deref().is_some_and(|s| s.starts_with("error"));
        if failed {
            let message = raw
                .error
                .or(raw.result)
                .unwrap_or_else(|| "CLI reported an error".to_string());
            return Err(classify_failure(&message));
        }

        let text = raw
            .result
            .ok_or_else(|| ProviderError::malformed("CLI result has no text"))?;
        let tokens_used = raw
            .usage
            .map(|u| u.input_tokens + u.output_tokens + u.cache_read_input_tokens)
            .unwrap_or(0);
        Ok(ProviderReply::new(text.trim(), tokens_used))
    }
}

fn classify_failure(message: &str) -> ProviderError {
    let lower = message.to_lowercase();
    if AUTH_MARKERS.iter().any(|marker| lower.contains(marker)) {
        ProviderError::auth(message.trim())
    } else {
        ProviderError::transient(message.trim())
    }
}

#[async_trait]
impl TextProvider for HeadlessProvider {
    fn name(&self) -> &str {
        "headless"
    }

    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<ProviderReply, ProviderError> {
        llog_debug!("headless: spawning {}", self.binary.display());
        let output = Command::new(&self.binary)
            .args(self.args(prompt))
            .output()
            .await
            .map_err(|e| ProviderError::transient(format!("failed to run CLI: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = Self::parse_output(&stdout);
        if output.status.success() {
            return parsed;
        }

        // A JSON error body on stdout carries a better message than stderr.
        match parsed {
            Ok(reply) => Ok(reply),
            Err(err) if err.kind != ProviderErrorKind::MalformedResponse => Err(err),
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = if stderr.trim().is_empty() {
                    format!("CLI exited with code {}", output.status.code().unwrap_or(-1))
                } else {
                    stderr.trim().to_string()
                };
                Err(classify_failure(&message))
            }
        }
    }
}
