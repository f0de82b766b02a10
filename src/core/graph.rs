//! Content graph: the DAG of content nodes for one working session.
//!
//! Edges run from a parent node to every node derived from it. A node can
//! only be appended once its parent is present, so the graph is acyclic by
//! construction and never holds a dangling derivation.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::assessment::{ContentScore, GeoScore, SeoMetadata};
use super::node::{count_words, ContentNode, NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::llog_debug;

/// The content graph.
///
/// Nodes live in a petgraph `DiGraph` whose edge weights record the kind of
/// derivation. `order` keeps insertion order for display.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<ContentNode>", into = "Vec<ContentNode>")]
pub struct ContentGraph {
    graph: DiGraph<ContentNode, NodeKind>,
    index: HashMap<NodeId, NodeIndex>,
    order: Vec<NodeId>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Rebuild a graph from an ordered node list, such as a loaded snapshot.
    ///
    /// Parents must appear before their children. Word counts are recounted
    /// from the text; a stored count is never trusted.
    pub fn from_nodes(nodes: Vec<ContentNode>) -> Result<Self> {
        let mut graph = Self::new();
        for mut node in nodes {
            let counted = count_words(&node.text);
            if node.word_count != counted {
                llog_debug!(
                    "ContentGraph: node {} claimed {} words, recounted {}",
                    node.id.short(),
                    node.word_count,
                    counted
                );
                node.word_count = counted;
            }
            graph.append(node)?;
        }
        Ok(graph)
    }

    /// Append a node, linking it to its parent.
    ///
    /// # Errors
    /// Returns a validation error if the id is already present, the parent is
    /// missing, or the node's kind disagrees with its parent link.
    pub fn append(&mut self, node: ContentNode) -> Result<NodeIndex> {
        if self.index.contains_key(&node.id) {
            return Err(Error::Validation(format!(
                "Node {} already exists in the graph",
                node.id
            )));
        }
        if !node.provenance_is_consistent() {
            return Err(Error::Validation(format!(
                "Node {} is {} but has parent {:?}",
                node.id,
                node.kind(),
                node.derived_from
            )));
        }

        let parent_index = match node.derived_from {
            Some(parent) => Some(*self.index.get(&parent).ok_or_else(|| {
                Error::Validation(format!(
                    "Node {} derives from {} which is not in the graph",
                    node.id, parent
                ))
            })?),
            None => None,
        };

        let id = node.id;
        let kind = node.kind();
        let index = self.graph.add_node(node);
        if let Some(parent_index) = parent_index {
            self.graph.add_edge(parent_index, index, kind);
        }
        self.index.insert(id, index);
        self.order.push(id);
        Ok(index)
    }

    pub fn get(&self, id: &NodeId) -> Option<&ContentNode> {
        self.index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ========== Assessment updates ==========
    //
    // The only post-creation mutations. Identity, text and provenance stay
    // untouched; each call replaces the previous value.

    pub fn set_score(&mut self, id: &NodeId, score: ContentScore) -> Result<()> {
        self.node_mut(id)?.score = Some(score);
        Ok(())
    }

    pub fn set_seo(&mut self, id: &NodeId, seo: SeoMetadata) -> Result<()> {
        self.node_mut(id)?.seo = Some(seo);
        Ok(())
    }

    pub fn set_geo(&mut self, id: &NodeId, geo: GeoScore) -> Result<()> {
        self.node_mut(id)?.geo = Some(geo);
        Ok(())
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut ContentNode> {
        let index = *self.index.get(id).ok_or(Error::NodeNotFound(*id))?;
        self.graph
            .node_weight_mut(index)
            .ok_or(Error::NodeNotFound(*id))
    }

    // ========== Queries ==========

    /// Nodes in insertion (display) order.
    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.order.iter().filter_map(move |id| self.get(id))
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    pub fn parent(&self, id: &NodeId) -> Option<&ContentNode> {
        self.get(id)?.derived_from.and_then(|p| self.get(&p))
    }

    /// Nodes derived directly from `id`, in insertion order.
    pub fn children(&self, id: &NodeId) -> Vec<&ContentNode> {
        let Some(&index) = self.index.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<(NodeIndex, &ContentNode)> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .filter_map(|child| self.graph.node_weight(child).map(|n| (child, n)))
            .collect();
        // Node indices grow with insertion, neighbors come back newest first.
        children.sort_by_key(|(child, _)| *child);
        children.into_iter().map(|(_, node)| node).collect()
    }

    /// Ancestors of `id`, nearest first, ending at a base node.
    pub fn lineage(&self, id: &NodeId) -> Vec<&ContentNode> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(&node.id);
        }
        chain
    }

    pub fn roots(&self) -> Vec<&ContentNode> {
        self.nodes().filter(|n| n.is_base()).collect()
    }

    pub fn count_by_kind(&self, kind: NodeKind) -> usize {
        self.graph.node_weights().filter(|n| n.kind() == kind).count()
    }

    /// Ordered copy of every node, for persistence.
    pub fn to_nodes(&self) -> Vec<ContentNode> {
        self.nodes().cloned().collect()
    }
}

impl Default for ContentGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ContentGraph {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.nodes().eq(other.nodes())
    }
}

impl TryFrom<Vec<ContentNode>> for ContentGraph {
    type Error = Error;

    fn try_from(nodes: Vec<ContentNode>) -> Result<Self> {
        Self::from_nodes(nodes)
    }
}

impl From<ContentGraph> for Vec<ContentNode> {
    fn from(graph: ContentGraph) -> Self {
        graph.to_nodes()
    }
}

impl std::fmt::Debug for ContentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGraph")
            .field("nodes", &self.len())
            .field("derivations", &self.edge_count())
            .finish()
    }
}
