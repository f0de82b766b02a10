use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::node::NodeId;
use crate::orchestration::OperationKind;

/// Orchestrator phase in which an unrecoverable failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PromptBuild,
    Generation,
    Scoring,
    Seo,
    Geo,
    InputEvaluation,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::PromptBuild => write!(f, "prompt-build"),
            Phase::Generation => write!(f, "generation"),
            Phase::Scoring => write!(f, "scoring"),
            Phase::Seo => write!(f, "seo"),
            Phase::Geo => write!(f, "geo"),
            Phase::InputEvaluation => write!(f, "input-evaluation"),
        }
    }
}

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Timeouts, rate limits, server-side failures. Safe to retry.
    Transient,
    /// Credentials missing or rejected.
    Auth,
    /// The provider answered but the answer could not be used.
    MalformedResponse,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::Transient => write!(f, "transient"),
            ProviderErrorKind::Auth => write!(f, "auth"),
            ProviderErrorKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Provider error ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Auth,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::MalformedResponse,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ProviderErrorKind::Transient
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Generation failed during {phase}: {source}")]
    Generation {
        phase: Phase,
        /// Nodes still present and valid in the content graph after the failure.
        retained: Vec<NodeId>,
        #[source]
        source: Box<Error>,
    },

    #[error("Another operation is in flight: {operation}")]
    Busy { operation: OperationKind },

    #[error("Content node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("No home directory")]
    NoHomeDir,
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Provider classification of this error or of the error it wraps.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Error::Provider(err) => Some(err.kind),
            Error::Generation { source, .. } => source.provider_kind(),
            _ => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Generation { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
