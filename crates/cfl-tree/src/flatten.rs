//! Treemap flattening
//!
//! Walks the tree pre-order and emits the four parallel sequences a
//! hierarchical box chart expects. Filters change displayed counts and labels
//! only; every node is always emitted.

use crate::node::{AggregationNode, NodeKind};
use crate::source::SourceId;
use crate::tree::AggregationTree;
use serde::{Deserialize, Serialize};

/// Decides which sources count towards displayed values
pub trait SourceFilter {
    /// Whether `source` is counted and shown
    fn includes(&self, source: &SourceId) -> bool;
}

impl<F> SourceFilter for F
where
    F: Fn(&SourceId) -> bool,
{
    fn includes(&self, source: &SourceId) -> bool {
        self(source)
    }
}

/// Hides the group's own contribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExcludeGroup;

impl SourceFilter for ExcludeGroup {
    #[inline]
    fn includes(&self, source: &SourceId) -> bool {
        !source.is_group()
    }
}

/// Order in which siblings are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildOrder {
    /// First-insertion order
    #[default]
    Insertion,
    /// Sorted by content; independent of insertion order
    Sorted,
}

/// How labels are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// Key name or value text
    #[default]
    Plain,
    /// Leaves also list their sources, e.g. `net1 [1001, 1002]`
    WithSources,
}

/// Flattening options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    /// Sibling order
    pub order: ChildOrder,
    /// Label rendering
    pub labels: LabelStyle,
}

impl FlattenOptions {
    /// With sibling order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: ChildOrder) -> Self {
        self.order = order;
        self
    }

    /// With label style
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: LabelStyle) -> Self {
        self.labels = labels;
        self
    }
}

/// Parallel chart sequences
///
/// Index `i` of every vector describes the same node. `parents[i]` is always
/// an id that appears earlier in `ids`, except for the root whose parent is
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreemapData {
    /// Node ids (dotted paths)
    pub ids: Vec<String>,
    /// Parent ids
    pub parents: Vec<String>,
    /// Display labels
    pub labels: Vec<String>,
    /// Displayed source counts
    pub values: Vec<usize>,
}

/// One row of [`TreemapData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreemapRow<'a> {
    /// Node id
    pub id: &'a str,
    /// Parent id, empty for the root
    pub parent: &'a str,
    /// Display label
    pub label: &'a str,
    /// Displayed source count
    pub value: usize,
}

impl TreemapData {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, id: String, parent: String, label: String, value: usize) {
        self.ids.push(id);
        self.parents.push(parent);
        self.labels.push(label);
        self.values.push(value);
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Row-wise view
    pub fn rows(&self) -> impl Iterator<Item = TreemapRow<'_>> {
        self.ids
            .iter()
            .zip(&self.parents)
            .zip(&self.labels)
            .zip(&self.values)
            .map(|(((id, parent), label), value)| TreemapRow {
                id,
                parent,
                label,
                value: *value,
            })
    }

    /// Row with the given id
    #[must_use]
    pub fn row(&self, id: &str) -> Option<TreemapRow<'_>> {
        self.rows().find(|row| row.id == id)
    }
}

/// Flatten with default options
///
/// `filter` of `None` counts every source.
#[must_use]
pub fn flatten(tree: &AggregationTree, filter: Option<&dyn SourceFilter>) -> TreemapData {
    flatten_with(tree, filter, FlattenOptions::default())
}

/// Flatten with explicit options
#[must_use]
pub fn flatten_with(
    tree: &AggregationTree,
    filter: Option<&dyn SourceFilter>,
    options: FlattenOptions,
) -> TreemapData {
    let mut out = TreemapData::with_capacity(tree.iter().count());
    let walker = Walker { filter, options };
    walker.visit(tree.root(), "", &mut out);
    out
}

struct Walker<'f> {
    filter: Option<&'f dyn SourceFilter>,
    options: FlattenOptions,
}

impl Walker<'_> {
    fn visit(&self, node: &AggregationNode, parent_id: &str, out: &mut TreemapData) {
        let id = node.path().to_string();
        if node.kind() == NodeKind::Root {
            out.push(id.clone(), String::new(), String::new(), 0);
        } else {
            out.push(
                id.clone(),
                parent_id.to_owned(),
                self.label(node),
                self.count(node),
            );
        }

        for child in self.ordered_children(node) {
            self.visit(child, &id, out);
        }
    }

    fn admitted<'a>(&'a self, node: &'a AggregationNode) -> impl Iterator<Item = &'a SourceId> + 'a {
        node.sources()
            .iter()
            .filter(move |source| self.filter.map_or(true, |f| f.includes(source)))
    }

    fn count(&self, node: &AggregationNode) -> usize {
        self.admitted(node).count()
    }

    fn label(&self, node: &AggregationNode) -> String {
        match self.options.labels {
            LabelStyle::WithSources if node.is_leaf() => {
                let sources: Vec<String> = self.admitted(node).map(ToString::to_string).collect();
                format!("{} [{}]", node.label(), sources.join(", "))
            }
            _ => node.label().to_owned(),
        }
    }

    fn ordered_children<'n>(&self, node: &'n AggregationNode) -> Vec<&'n AggregationNode> {
        let mut children: Vec<_> = node.children().collect();
        if self.options.order == ChildOrder::Sorted {
            children.sort_by(|a, b| a.content().cmp(&b.content()));
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConfigDocument;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scenario() -> AggregationTree {
        let mut tree = AggregationTree::new();
        let device = ConfigDocument::from_value(json!({"wifi": {"ssid": "net1"}})).unwrap();
        let group = ConfigDocument::from_value(json!({"wifi": {"ssid": "net0"}})).unwrap();
        tree.insert(&SourceId::device("D1"), &device).unwrap();
        tree.insert(&SourceId::device("D2"), &device).unwrap();
        tree.insert(&SourceId::Group, &group).unwrap();
        tree
    }

    #[test]
    fn unfiltered_sequences() {
        let data = flatten(&scenario(), None);
        assert_eq!(
            data.ids,
            vec![
                "ROOT",
                "ROOT.wifi",
                "ROOT.wifi.ssid",
                "ROOT.wifi.ssid.=net1",
                "ROOT.wifi.ssid.=net0"
            ]
        );
        assert_eq!(
            data.parents,
            vec!["", "ROOT", "ROOT.wifi", "ROOT.wifi.ssid", "ROOT.wifi.ssid"]
        );
        assert_eq!(data.labels, vec!["", "wifi", "ssid", "net1", "net0"]);
        assert_eq!(data.values, vec![0, 3, 3, 2, 1]);
    }

    #[test]
    fn exclude_group_adjusts_counts_only() {
        let data = flatten(&scenario(), Some(&ExcludeGroup));
        assert_eq!(data.len(), 5);
        assert_eq!(data.values, vec![0, 2, 2, 2, 0]);
        assert_eq!(data.labels, vec!["", "wifi", "ssid", "net1", "net0"]);
    }

    #[test]
    fn source_labels_strip_filtered_sources() {
        let options = FlattenOptions::default().with_labels(LabelStyle::WithSources);
        let all = flatten_with(&scenario(), None, options);
        assert_eq!(all.row("ROOT.wifi.ssid.=net0").unwrap().label, "net0 [group]");
        assert_eq!(all.row("ROOT.wifi.ssid.=net1").unwrap().label, "net1 [D1, D2]");

        let filtered = flatten_with(&scenario(), Some(&ExcludeGroup), options);
        assert_eq!(filtered.row("ROOT.wifi.ssid.=net0").unwrap().label, "net0 []");
        assert_eq!(filtered.row("ROOT.wifi.ssid.=net1").unwrap().label, "net1 [D1, D2]");
        // Inner nodes keep plain labels
        assert_eq!(filtered.row("ROOT.wifi").unwrap().label, "wifi");
    }

    #[test]
    fn closure_filters_work() {
        let only_d1 = |s: &SourceId| *s == SourceId::device("D1");
        let data = flatten(&scenario(), Some(&only_d1));
        assert_eq!(data.values, vec![0, 1, 1, 1, 0]);
    }

    #[test]
    fn sorted_order_ignores_insertion() {
        let mut tree = AggregationTree::new();
        let doc = ConfigDocument::from_value(json!({"b": "2", "a": "1"})).unwrap();
        tree.insert(&SourceId::device("1"), &doc).unwrap();
        tree.insert(
            &SourceId::device("2"),
            &ConfigDocument::from_value(json!({"a": "0"})).unwrap(),
        )
        .unwrap();

        let sorted = flatten_with(
            &tree,
            None,
            FlattenOptions::default().with_order(ChildOrder::Sorted),
        );
        assert_eq!(
            sorted.ids,
            vec!["ROOT", "ROOT.a", "ROOT.a.=0", "ROOT.a.=1", "ROOT.b", "ROOT.b.=2"]
        );
    }

    #[test]
    fn empty_tree_is_just_root() {
        let data = flatten(&AggregationTree::new(), None);
        assert_eq!(data.ids, vec!["ROOT"]);
        assert_eq!(data.parents, vec![""]);
        assert_eq!(data.values, vec![0]);
    }

    #[test]
    fn one_row_per_node_in_walk_order() {
        let tree = scenario();
        let data = flatten(&tree, Some(&ExcludeGroup));
        assert_eq!(data.len(), tree.iter().count());
        let walked: Vec<String> = tree.iter().map(|n| n.path().to_string()).collect();
        assert_eq!(data.ids, walked);
    }

    #[test]
    fn serializes_as_four_arrays() {
        let data = flatten(&scenario(), None);
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["ids"].as_array().unwrap().len(), 5);
        assert_eq!(value["values"][1], json!(3));
    }
}
