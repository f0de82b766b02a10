//! Events emitted by [`update`](super::update) and broadcast to subscribers.

use serde::Serialize;

use crate::core::{NodeId, NodeKind};
use crate::error::Phase;
use crate::orchestration::OperationKind;

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Cancelled,
    Failed {
        phase: Option<Phase>,
        message: String,
    },
}

/// Which optional assessment on a node changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeField {
    Score,
    Seo,
    Geo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    OperationStarted {
        operation: OperationKind,
    },
    Progress {
        line: String,
    },
    NodeAppended {
        id: NodeId,
        kind: NodeKind,
    },
    NodeUpdated {
        id: NodeId,
        field: NodeField,
    },
    InputsEvaluated {
        score: u8,
    },
    OperationFinished {
        operation: OperationKind,
        outcome: Outcome,
    },
    GraphReplaced {
        nodes: usize,
    },
    Cleared,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::OperationStarted { operation } => write!(f, "started {}", operation),
            Event::Progress { line } => write!(f, "{}", line),
            Event::NodeAppended { id, kind } => write!(f, "added {} node {}", kind, id.short()),
            Event::NodeUpdated { id, field } => {
                write!(f, "updated {:?} on node {}", field, id.short())
            }
            Event::InputsEvaluated { score } => write!(f, "inputs scored {}/100", score),
            Event::OperationFinished { operation, outcome } => match outcome {
                Outcome::Succeeded => write!(f, "{} finished", operation),
                Outcome::Cancelled => write!(f, "{} cancelled", operation),
                Outcome::Failed { phase: Some(phase), message } => {
                    write!(f, "{} failed during {}: {}", operation, phase, message)
                }
                Outcome::Failed { phase: None, message } => {
                    write!(f, "{} failed: {}", operation, message)
                }
            },
            Event::GraphReplaced { nodes } => write!(f, "graph replaced ({} nodes)", nodes),
            Event::Cleared => write!(f, "session cleared"),
        }
    }
}
