//! Config Layers aggregation tree
//!
//! Merges configuration documents from many devices (plus the group they
//! belong to) into a single deduplicated trie, then flattens it into the
//! parallel id/parent/label/value sequences a treemap chart consumes.
//!
//! # Core Concepts
//!
//! - [`ConfigDocument`]: a nested key/value configuration as fetched per source
//! - [`SourceId`]: a device id or the synthetic `group` sentinel
//! - [`AggregationTree`]: the trie; every node carries the set of sources that
//!   reached it
//! - [`NodePath`]: stable dotted identity of a node, used as chart id
//! - [`flatten`]: pre-order walk producing [`TreemapData`]
//!
//! # Example
//!
//! ```rust
//! use cfl_tree::{flatten, AggregationTree, ConfigDocument, ExcludeGroup, SourceId};
//! use serde_json::json;
//!
//! let mut tree = AggregationTree::new();
//! let device = ConfigDocument::from_value(json!({"wifi": {"ssid": "net1"}})).unwrap();
//! let group = ConfigDocument::from_value(json!({"wifi": {"ssid": "net0"}})).unwrap();
//! tree.insert(&SourceId::device("1001"), &device).unwrap();
//! tree.insert(&SourceId::Group, &group).unwrap();
//!
//! let data = flatten(&tree, Some(&ExcludeGroup));
//! assert_eq!(data.ids[0], "ROOT");
//! assert_eq!(data.len(), 5);
//! ```

#![warn(unreachable_pub)]

mod document;
mod error;
mod flatten;
mod node;
mod path;
mod source;
mod subtree;
mod tree;

pub use document::{canonical_value, ConfigDocument};
pub use error::{BuildError, LookupError, ShapeError};
pub use flatten::{
    flatten, flatten_with, ChildOrder, ExcludeGroup, FlattenOptions, LabelStyle, SourceFilter,
    TreemapData, TreemapRow,
};
pub use node::{AggregationNode, NodeKind};
pub use path::{NodeContent, NodePath, PathError, ROOT_TOKEN};
pub use source::{DeviceId, SourceId, GROUP_SENTINEL};
pub use subtree::subtree_to_dict;
pub use tree::{path_lookup, AggregationTree, BooleanPolicy, TreeBuilder, TreeStats, MAX_DEPTH};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and rendering aggregation trees
    pub use crate::{
        flatten, flatten_with, path_lookup, subtree_to_dict, AggregationTree, BooleanPolicy, ConfigDocument,
        DeviceId, ExcludeGroup, FlattenOptions, SourceId, TreeBuilder, TreemapData,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_flatten_lookup_cycle() {
        let mut builder = TreeBuilder::new(BooleanPolicy::default());
        let doc = ConfigDocument::from_value(json!({"system": {"ntp": "pool.ntp.org"}})).unwrap();
        builder.add_device(&DeviceId::new("7"), &doc).unwrap();
        let tree = builder.finish();

        let data = flatten(&tree, None);
        for id in &data.ids {
            let node = path_lookup(&tree, id).unwrap();
            assert_eq!(&node.path().to_string(), id);
        }
    }
}
