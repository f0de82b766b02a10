//! Orchestration layer.
//!
//! The [`Orchestrator`] drives every user action through the provider
//! gateway. The [`SessionController`] allows one action at a time and
//! carries its cancellation token. The [`AdherenceLoop`] revises drafts
//! toward a target word count.

mod adherence;
mod orchestrator;
pub mod parse;
mod session;

pub use adherence::{AdherenceLoop, AdherenceOutcome, LoopState, Tolerance};
pub use orchestrator::Orchestrator;
pub use session::{CurrentOperation, OperationGuard, OperationKind, SessionController};
