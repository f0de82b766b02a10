//! Messages for the store.
//!
//! Messages are inputs to [`update`](super::update): they come from the
//! orchestrator as an operation starts, reports progress and finishes, or
//! from the caller restoring or clearing the session.

use crate::core::{Brief, ContentGraph, ContentNode, ContentScore, GeoScore, InputEvaluation, NodeId, SeoMetadata};
use crate::error::Phase;
use crate::orchestration::OperationKind;

#[derive(Debug, Clone)]
pub enum Message {
    // Operation lifecycle
    /// Clears the progress log of the previous operation.
    OperationStarted(OperationKind),
    Progress(String),
    OperationSucceeded,
    OperationCancelled,
    OperationFailed {
        phase: Option<Phase>,
        message: String,
    },

    // Graph mutations
    /// Append a fully-formed node.
    NodeAppended(ContentNode),
    ScoreUpdated(NodeId, ContentScore),
    SeoUpdated(NodeId, SeoMetadata),
    GeoUpdated(NodeId, GeoScore),

    // Session-level state
    InputsEvaluated(InputEvaluation),
    BriefLoaded(Brief),
    /// Replace the graph wholesale, as after a snapshot restore.
    GraphReplaced(ContentGraph),
    Cleared,
}
