//! Persistence collaborator.
//!
//! Snapshots are opaque `{brief, nodes}` bundles saved as a session, a
//! template (brief only) or a saved output. Loading one hands back the same
//! shape; the caller replaces its graph wholesale, never node by node.
//!
//! [`SnapshotRef::from_query`] is the identifier loader: three mutually
//! exclusive ids, validated before any store is touched.

mod file;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Brief, ContentGraph, ContentNode};
use crate::error::{Error, Result};

pub use file::FileSnapshotStore;

/// Longest identifier accepted by the loader.
pub const MAX_IDENTIFIER_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Session,
    Template,
    SavedOutput,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 3] = [
        SnapshotKind::Session,
        SnapshotKind::Template,
        SnapshotKind::SavedOutput,
    ];

    /// Directory name used by file-backed stores.
    pub fn dir_name(&self) -> &'static str {
        match self {
            SnapshotKind::Session => "sessions",
            SnapshotKind::Template => "templates",
            SnapshotKind::SavedOutput => "outputs",
        }
    }

    /// Whether snapshots of this kind carry content nodes.
    pub fn carries_nodes(&self) -> bool {
        !matches!(self, SnapshotKind::Template)
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Session => write!(f, "session"),
            SnapshotKind::Template => write!(f, "template"),
            SnapshotKind::SavedOutput => write!(f, "saved output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub kind: SnapshotKind,
    pub brief: Brief,
    /// Graph nodes in insertion order. Always empty for templates.
    #[serde(default)]
    pub nodes: Vec<ContentNode>,
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(kind: SnapshotKind, brief: Brief, graph: &ContentGraph) -> Self {
        let nodes = if kind.carries_nodes() {
            graph.to_nodes()
        } else {
            Vec::new()
        };
        Self {
            kind,
            brief,
            nodes,
            saved_at: Utc::now(),
        }
    }

    /// Rebuild the content graph, rejecting dangling derivations.
    pub fn graph(&self) -> Result<ContentGraph> {
        ContentGraph::from_nodes(self.nodes.clone())
    }
}

/// Reject empty, overlong or non `[A-Za-z0-9_-]` identifiers.
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidIdentifier("identifier is empty".to_string()));
    }
    if id.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidIdentifier(format!(
            "identifier is longer than {} characters",
            MAX_IDENTIFIER_LEN
        )));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(Error::InvalidIdentifier(format!(
            "identifier contains '{}'",
            bad
        )));
    }
    Ok(())
}

/// A validated pointer to one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotRef {
    kind: SnapshotKind,
    id: String,
}

impl SnapshotRef {
    pub fn new(kind: SnapshotKind, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self { kind, id })
    }

    /// Resolve the three loader identifiers into at most one reference.
    ///
    /// Returns `Ok(None)` when none is present. More than one present, or an
    /// invalid one, is an error and nothing should be fetched.
    pub fn from_query(
        session: Option<&str>,
        template: Option<&str>,
        saved_output: Option<&str>,
    ) -> Result<Option<Self>> {
        let present: Vec<(SnapshotKind, &str)> = [
            (SnapshotKind::Session, session),
            (SnapshotKind::Template, template),
            (SnapshotKind::SavedOutput, saved_output),
        ]
        .into_iter()
        .filter_map(|(kind, id)| id.map(|id| (kind, id)))
        .collect();

        match present.as_slice() {
            [] => Ok(None),
            [(kind, id)] => Self::new(*kind, *id).map(Some),
            _ => Err(Error::Validation(
                "session, template and saved-output identifiers are mutually exclusive"
                    .to_string(),
            )),
        }
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store a snapshot under a fresh identifier.
    async fn save(&self, snapshot: &Snapshot) -> Result<SnapshotRef>;

    async fn load(&self, reference: &SnapshotRef) -> Result<Snapshot>;

    /// Identifiers of every stored snapshot of `kind`, sorted.
    async fn list(&self, kind: SnapshotKind) -> Result<Vec<String>>;
}
