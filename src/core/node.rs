//! Content node data model.
//!
//! A node is one generated or derived piece of copy plus its provenance and
//! any assessments attached to it after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::{ContentScore, GeoScore, SeoMetadata};

/// Unique identifier for a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// What kind of content a node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Base,
    Alternative,
    Styled,
    Humanized,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Base => write!(f, "base"),
            NodeKind::Alternative => write!(f, "alternative"),
            NodeKind::Styled => write!(f, "styled"),
            NodeKind::Humanized => write!(f, "humanized"),
        }
    }
}

/// How a node came to exist. The variant determines the node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Derivation {
    /// Generated from the brief alone.
    Base,
    /// A divergent take on the parent's message.
    Alternative,
    /// The parent rewritten in a named style.
    Styled {
        /// Style registry id, e.g. `steve-jobs`.
        style: String,
    },
    /// The parent rewritten to read as natural human prose.
    Humanized,
}

impl Derivation {
    pub fn kind(&self) -> NodeKind {
        match self {
            Derivation::Base => NodeKind::Base,
            Derivation::Alternative => NodeKind::Alternative,
            Derivation::Styled { .. } => NodeKind::Styled,
            Derivation::Humanized => NodeKind::Humanized,
        }
    }
}

impl std::fmt::Display for Derivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Derivation::Styled { style } => write!(f, "styled: {}", style),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Count words the way writers do: whitespace-separated tokens with at least
/// one letter or digit. Markdown markers (`#`, `-`, `*`) are not words.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count() as u32
}

/// One generated or derived piece of copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    pub derivation: Derivation,
    /// Parent node; `None` exactly when `derivation` is `Base`.
    pub derived_from: Option<NodeId>,
    pub text: String,
    pub word_count: u32,
    /// Tokens spent producing the text, revisions included.
    #[serde(default)]
    pub tokens_used: u64,
    pub score: Option<ContentScore>,
    pub seo: Option<SeoMetadata>,
    pub geo: Option<GeoScore>,
    pub created_at: DateTime<Utc>,
}

impl ContentNode {
    fn build(derivation: Derivation, derived_from: Option<NodeId>, text: String) -> Self {
        let word_count = count_words(&text);
        Self {
            id: NodeId::new(),
            derivation,
            derived_from,
            text,
            word_count,
            tokens_used: 0,
            score: None,
            seo: None,
            geo: None,
            created_at: Utc::now(),
        }
    }

    pub fn base(text: impl Into<String>) -> Self {
        Self::build(Derivation::Base, None, text.into())
    }

    /// A node derived from `parent`. `derivation` must not be `Base`.
    pub fn derived(parent: NodeId, derivation: Derivation, text: impl Into<String>) -> Self {
        debug_assert!(derivation != Derivation::Base);
        Self::build(derivation, Some(parent), text.into())
    }

    pub fn with_tokens(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.derivation.kind()
    }

    pub fn is_base(&self) -> bool {
        self.derived_from.is_none()
    }

    /// Base nodes have no parent and every other node has one.
    pub fn provenance_is_consistent(&self) -> bool {
        (self.derivation == Derivation::Base) == self.derived_from.is_none()
    }
}
