//! Core domain model: the brief that parameterizes generation, content
//! nodes, the content graph that relates them, and node assessments.

pub mod assessment;
pub mod brief;
pub mod graph;
pub mod node;

pub use assessment::{
    ContentScore, GeoScore, InputEvaluation, SeoField, SeoFieldKind, SeoMetadata,
};
pub use brief::{
    AudienceProfile, Brief, BriefMode, BusinessFacts, FeatureToggles, SectionSpec, ToneProfile,
    WordPolicy,
};
pub use graph::ContentGraph;
pub use node::{count_words, ContentNode, Derivation, NodeId, NodeKind};
