//! Plain nested rendering of a subtree, for display next to the chart

use crate::node::AggregationNode;
use serde_json::{Map, Value};

/// Render the subtree rooted at `node` as nested JSON
///
/// A childless node is its label. Otherwise the node becomes
/// `{label: children}`, where `children` is the label of a single childless
/// child, an array of labels when all children are childless, or an object
/// keyed by child label (childless entries map to `null`).
///
/// Source sets are not included; this is presentation only.
#[must_use]
pub fn subtree_to_dict(node: &AggregationNode) -> Value {
    if node.is_leaf() {
        return Value::String(node.label().to_owned());
    }
    let mut map = Map::new();
    map.insert(node.label().to_owned(), render_children(node));
    Value::Object(map)
}

fn render_children(node: &AggregationNode) -> Value {
    if node.children().all(AggregationNode::is_leaf) {
        let mut labels: Vec<Value> = node
            .children()
            .map(|child| Value::String(child.label().to_owned()))
            .collect();
        return if labels.len() == 1 {
            labels.remove(0)
        } else {
            Value::Array(labels)
        };
    }

    let mut map = Map::new();
    for child in node.children() {
        let rendered = if child.is_leaf() {
            Value::Null
        } else {
            render_children(child)
        };
        map.insert(child.label().to_owned(), rendered);
    }
    Value::Object(map)
}
