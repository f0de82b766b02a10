pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod persistence;
pub mod prompt;
pub mod provider;
pub mod store;
pub mod util;

pub use crate::core::{Brief, ContentGraph, ContentNode, NodeId, NodeKind};
pub use error::{Error, Phase, ProviderError, ProviderErrorKind, Result};
pub use orchestration::{OperationKind, Orchestrator};
pub use provider::{ProviderGateway, TextProvider};
