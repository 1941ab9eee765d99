//! Aggregation tree nodes

use crate::path::{NodeContent, NodePath, ROOT_TOKEN};
use crate::source::SourceId;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Node kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic root
    Root,
    /// A configuration key
    Key,
    /// A terminal observed value
    Value,
}

/// One node of the aggregation tree
///
/// Children are kept in first-insertion order and indexed by their content,
/// so a key node may hold key children (nested documents) and value children
/// (scalars) side by side when sources disagree on the shape of a key.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationNode {
    /// Full path; the last segment is this node's own content
    path: NodePath,

    /// Sources that reached this node
    sources: BTreeSet<SourceId>,

    children: IndexMap<NodeContent, AggregationNode>,
}

impl AggregationNode {
    pub(crate) fn root() -> Self {
        Self::with_path(NodePath::root())
    }

    fn with_path(path: NodePath) -> Self {
        Self {
            path,
            sources: BTreeSet::new(),
            children: IndexMap::new(),
        }
    }

    /// Node content, `None` for the root
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&NodeContent> {
        self.path.last()
    }

    /// Node kind
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.content() {
            None => NodeKind::Root,
            Some(NodeContent::Key(_)) => NodeKind::Key,
            Some(NodeContent::Value(_)) => NodeKind::Value,
        }
    }

    /// Display text: key name, value text, or the root token
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.content().map_or(ROOT_TOKEN, NodeContent::text)
    }

    /// Path from the root
    #[inline]
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Sources that reached this node
    #[inline]
    #[must_use]
    pub fn sources(&self) -> &BTreeSet<SourceId> {
        &self.sources
    }

    /// Number of sources
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.sources.len()
    }

    /// Check if a source reached this node
    #[inline]
    #[must_use]
    pub fn contains_source(&self, source: &SourceId) -> bool {
        self.sources.contains(source)
    }

    /// Children in first-insertion order
    #[inline]
    pub fn children(&self) -> impl ExactSizeIterator<Item = &AggregationNode> {
        self.children.values()
    }

    /// Child with the given content
    #[inline]
    #[must_use]
    pub fn child(&self, content: &NodeContent) -> Option<&AggregationNode> {
        self.children.get(content)
    }

    /// Number of direct children
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Find or create the child with the given content
    pub(crate) fn child_entry(&mut self, content: NodeContent) -> &mut AggregationNode {
        match self.children.entry(content) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.path.child(entry.key().clone());
                entry.insert(AggregationNode::with_path(path))
            }
        }
    }

    pub(crate) fn record(&mut self, source: &SourceId) {
        self.sources.insert(source.clone());
    }
}
