use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{llog_debug, Error, Result};

pub const DEFAULT_HEADLESS_BINARY: &str = "claude";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Which provider implementation backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// A local model CLI run in print mode with JSON output.
    #[default]
    Headless,
    /// Any OpenAI-compatible chat-completions endpoint.
    #[serde(alias = "openai_compatible")]
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    pub binary: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        let default = match self.kind {
            ProviderKind::Headless => 600,
            ProviderKind::Openai => 120,
        };
        Duration::from_secs(self.timeout_secs.unwrap_or(default))
    }

    pub fn effective_binary(&self) -> &str {
        self.binary.as_deref().unwrap_or(DEFAULT_HEADLESS_BINARY)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    pub fn effective_api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub snapshot_dir: Option<String>,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".copyloom"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("copyloom.toml"))
    }

    pub fn snapshots_dir(&self) -> Result<PathBuf> {
        match &self.snapshot_dir {
            Some(dir) => Ok(expand_tilde(dir)),
            None => Ok(Self::app_dir()?.join("snapshots")),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        llog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            llog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        llog_debug!(
            "Config loaded: provider={:?}, snapshot_dir={:?}",
            config.provider.kind,
            config.snapshot_dir
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let app_dir = Self::app_dir()?;
        if !app_dir.exists() {
            fs::create_dir_all(&app_dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        llog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        let snapshots = self.snapshots_dir()?;
        if !snapshots.exists() {
            llog_debug!("Creating snapshot directory: {}", snapshots.display());
            fs::create_dir_all(&snapshots)?;
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
