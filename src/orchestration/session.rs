//! Session/cancellation controller.
//!
//! Tracks the one operation allowed in flight per working session. A new
//! operation is rejected with [`Error::Busy`] while another is active; the
//! only action available meanwhile is [`SessionController::cancel`].

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::{llog, llog_debug};

/// Every user-initiated unit of work the orchestrator exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    GenerateBase,
    CreateAlternative,
    ApplyStyle,
    Humanize,
    GenerateScore,
    GenerateSeo,
    GenerateGeo,
    EvaluateInputs,
    Restore,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::GenerateBase => "generate",
            OperationKind::CreateAlternative => "alternative",
            OperationKind::ApplyStyle => "apply-style",
            OperationKind::Humanize => "humanize",
            OperationKind::GenerateScore => "score",
            OperationKind::GenerateSeo => "seo",
            OperationKind::GenerateGeo => "geo",
            OperationKind::EvaluateInputs => "evaluate-inputs",
            OperationKind::Restore => "restore",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
struct ActiveOperation {
    kind: OperationKind,
    token: CancellationToken,
    started_at: DateTime<Utc>,
}

/// Snapshot of the in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentOperation {
    pub kind: OperationKind,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionController {
    active: Arc<Mutex<Option<ActiveOperation>>>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveOperation>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the session for `kind`.
    ///
    /// The returned guard carries the operation's cancellation token and
    /// releases the session when dropped.
    pub fn begin(&self, kind: OperationKind) -> Result<OperationGuard> {
        let mut active = self.lock();
        if let Some(current) = active.as_ref() {
            llog_debug!("session: rejecting {} while {} runs", kind, current.kind);
            return Err(Error::Busy {
                operation: current.kind,
            });
        }
        let token = CancellationToken::new();
        *active = Some(ActiveOperation {
            kind,
            token: token.clone(),
            started_at: Utc::now(),
        });
        llog_debug!("session: begin {}", kind);
        Ok(OperationGuard {
            active: Arc::clone(&self.active),
            kind,
            token,
        })
    }

    /// Signal cancellation to the in-flight operation.
    ///
    /// Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        match self.lock().as_ref() {
            Some(current) => {
                llog!("session: cancel requested for {}", current.kind);
                current.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    pub fn current(&self) -> Option<CurrentOperation> {
        self.lock().as_ref().map(|op| CurrentOperation {
            kind: op.kind,
            started_at: op.started_at,
        })
    }
}

/// Proof that the session is claimed by one operation.
#[derive(Debug)]
pub struct OperationGuard {
    active: Arc<Mutex<Option<ActiveOperation>>>,
    kind: OperationKind,
    token: CancellationToken,
}

impl OperationGuard {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        llog_debug!("session: end {}", self.kind);
        *active = None;
    }
}
