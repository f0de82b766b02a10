//! Model for the reducer-style store.
//!
//! The Model is plain serializable state: no channels, no tokens, no
//! provider handles.

use serde::{Deserialize, Serialize};

use crate::core::{Brief, ContentGraph, InputEvaluation};
use crate::error::Phase;
use crate::orchestration::OperationKind;

/// What the store believes the orchestrator is doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Running(OperationKind),
    Succeeded(OperationKind),
    Cancelled(OperationKind),
    Failed {
        operation: OperationKind,
        phase: Option<Phase>,
        message: String,
    },
}

impl Activity {
    pub fn is_running(&self) -> bool {
        matches!(self, Activity::Running(_))
    }

    /// The operation this status refers to, if any.
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Activity::Idle => None,
            Activity::Running(op) | Activity::Succeeded(op) | Activity::Cancelled(op) => Some(*op),
            Activity::Failed { operation, .. } => Some(*operation),
        }
    }
}

/// The single source of truth for one working session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Model {
    /// Brief of the most recent operation, or the one restored from a snapshot.
    pub brief: Option<Brief>,
    pub graph: ContentGraph,
    /// Human-readable progress of the current (or last) operation.
    pub progress: Vec<String>,
    pub activity: Activity,
    /// Result of the last input evaluation. Never part of the graph.
    pub evaluation: Option<InputEvaluation>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }
}
