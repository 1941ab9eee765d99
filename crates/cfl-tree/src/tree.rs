//! Aggregation tree and build procedure
//!
//! [`AggregationTree::insert`] merges one source's document into the trie.
//! [`TreeBuilder`] wraps it with the build procedure: every device once with
//! its own id, then the group exactly once under the sentinel.

use crate::document::{canonical_value, ConfigDocument};
use crate::error::{BuildError, LookupError, ShapeError};
use crate::node::{AggregationNode, NodeKind};
use crate::path::{NodeContent, NodePath};
use crate::source::{DeviceId, SourceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Deepest nesting of mappings accepted by [`AggregationTree::insert`]
pub const MAX_DEPTH: usize = 64;

/// Which boolean leaves are recorded on the key only
///
/// A suppressed boolean marks the key as visited by the source but creates no
/// value child. By default only `true` is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanPolicy {
    /// Do not branch on `true`
    pub suppress_true: bool,
    /// Do not branch on `false`
    pub suppress_false: bool,
}

impl BooleanPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(suppress_true: bool, suppress_false: bool) -> Self {
        Self {
            suppress_true,
            suppress_false,
        }
    }

    /// Policy that records every boolean as a value
    #[inline]
    #[must_use]
    pub fn record_all() -> Self {
        Self::new(false, false)
    }

    /// Check if a leaf value is suppressed
    #[inline]
    #[must_use]
    pub fn suppresses(&self, value: &Value) -> bool {
        match value {
            Value::Bool(true) => self.suppress_true,
            Value::Bool(false) => self.suppress_false,
            _ => false,
        }
    }
}

impl Default for BooleanPolicy {
    fn default() -> Self {
        Self::new(true, false)
    }
}

/// Deduplicated trie over the documents of all sources
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationTree {
    root: AggregationNode,
    policy: BooleanPolicy,
}

impl AggregationTree {
    /// Create empty tree with the default boolean policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(BooleanPolicy::default())
    }

    /// Create empty tree with a boolean policy
    #[inline]
    #[must_use]
    pub fn with_policy(policy: BooleanPolicy) -> Self {
        Self {
            root: AggregationNode::root(),
            policy,
        }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &AggregationNode {
        &self.root
    }

    /// Active boolean policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> BooleanPolicy {
        self.policy
    }

    /// Check if nothing was inserted yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_leaf()
    }

    /// Merge one source's document into the tree
    ///
    /// The document is validated before any node is touched, so a failed
    /// insert leaves the tree unchanged.
    ///
    /// # Errors
    /// Returns [`ShapeError::TooDeep`] if mappings nest beyond [`MAX_DEPTH`]
    pub fn insert(&mut self, source: &SourceId, document: &ConfigDocument) -> Result<(), ShapeError> {
        if document.depth() > MAX_DEPTH {
            return Err(ShapeError::TooDeep { limit: MAX_DEPTH });
        }
        insert_map(&mut self.root, source, document.as_map(), self.policy);
        Ok(())
    }

    /// Resolve a chart id to its node
    ///
    /// # Errors
    /// Returns error if the id is malformed or names a missing node
    pub fn lookup(&self, id: &str) -> Result<&AggregationNode, LookupError> {
        let path: NodePath = id.parse()?;
        self.get(&path)
    }

    /// Resolve a path to its node
    ///
    /// # Errors
    /// Returns [`LookupError::NotFound`] with the first prefix that does not exist
    pub fn get(&self, path: &NodePath) -> Result<&AggregationNode, LookupError> {
        let mut current = &self.root;
        for segment in path.iter() {
            current = current.child(segment).ok_or_else(|| LookupError::NotFound {
                path: current.path().child(segment.clone()).to_string(),
            })?;
        }
        Ok(current)
    }

    /// All sources that contributed at least one key
    #[must_use]
    pub fn sources(&self) -> BTreeSet<SourceId> {
        self.root
            .children()
            .flat_map(|child| child.sources().iter().cloned())
            .collect()
    }

    /// Pre-order walk in first-insertion order, root first
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![&self.root],
        }
    }

    /// Summary counters
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            sources: self.sources().len(),
            ..TreeStats::default()
        };
        for node in self.iter() {
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(node.path().len());
            match node.kind() {
                NodeKind::Key => stats.key_nodes += 1,
                NodeKind::Value => stats.value_nodes += 1,
                NodeKind::Root => {}
            }
        }
        stats
    }
}

/// Resolve a chart id produced by [`flatten`](crate::flatten) to its node
///
/// # Errors
/// Returns error if the id is malformed or names a missing node
pub fn path_lookup<'t>(tree: &'t AggregationTree, id: &str) -> Result<&'t AggregationNode, LookupError> {
    tree.lookup(id)
}

impl Default for AggregationTree {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_map(
    node: &mut AggregationNode,
    source: &SourceId,
    map: &Map<String, Value>,
    policy: BooleanPolicy,
) {
    for (key, value) in map {
        let key_node = node.child_entry(NodeContent::Key(key.clone()));
        key_node.record(source);

        match value {
            Value::Object(nested) => insert_map(key_node, source, nested, policy),
            leaf if policy.suppresses(leaf) => {}
            leaf => key_node
                .child_entry(NodeContent::Value(canonical_value(leaf)))
                .record(source),
        }
    }
}

/// Pre-order iterator over tree nodes
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a AggregationNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a AggregationNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so the first child is popped next
        let start = self.stack.len();
        self.stack.extend(node.children());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Summary counters of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// All nodes including the root
    pub nodes: usize,
    /// Key nodes
    pub key_nodes: usize,
    /// Value nodes
    pub value_nodes: usize,
    /// Longest path below the root
    pub max_depth: usize,
    /// Distinct sources, group included
    pub sources: usize,
}

/// Build procedure over an [`AggregationTree`]
///
/// Devices are inserted under their own ids; the group document goes in once
/// under [`SourceId::Group`].
#[derive(Debug)]
pub struct TreeBuilder {
    tree: AggregationTree,
    devices: BTreeSet<DeviceId>,
    group_added: bool,
}

impl TreeBuilder {
    /// Start a build
    #[inline]
    #[must_use]
    pub fn new(policy: BooleanPolicy) -> Self {
        Self {
            tree: AggregationTree::with_policy(policy),
            devices: BTreeSet::new(),
            group_added: false,
        }
    }

    /// Insert one device's document
    ///
    /// # Errors
    /// Returns error if the document is malformed
    pub fn add_device(&mut self, device: &DeviceId, document: &ConfigDocument) -> Result<(), BuildError> {
        let source = SourceId::Device(device.clone());
        self.tree
            .insert(&source, document)
            .map_err(|e| BuildError::shape(source, e))?;
        if !self.devices.insert(device.clone()) {
            tracing::debug!("device {} inserted more than once", device);
        }
        Ok(())
    }

    /// Insert the group document
    ///
    /// # Errors
    /// Returns error if the group was already inserted or the document is malformed
    pub fn add_group(&mut self, document: &ConfigDocument) -> Result<(), BuildError> {
        if self.group_added {
            return Err(BuildError::GroupAlreadyAdded);
        }
        self.tree
            .insert(&SourceId::Group, document)
            .map_err(|e| BuildError::shape(SourceId::Group, e))?;
        self.group_added = true;
        Ok(())
    }

    /// Number of distinct devices inserted
    #[inline]
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Whether the group document was inserted
    #[inline]
    #[must_use]
    pub fn has_group(&self) -> bool {
        self.group_added
    }

    /// Finish the build
    #[inline]
    #[must_use]
    pub fn finish(self) -> AggregationTree {
        self.tree
    }
}
