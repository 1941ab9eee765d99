use cfl_tree::prelude::*;
use cfl_tree::{ChildOrder, NodeKind};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashSet};

fn set_path(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.insert((*first).to_string(), value);
        return;
    }
    let slot = map
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(inner) = slot {
        set_path(inner, rest, value);
    }
}

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!(true)),
        Just(json!(false)),
        Just(json!("x")),
        Just(json!("y.z")),
        Just(json!(1)),
        Just(json!(null)),
        Just(json!(["p", "q"])),
    ]
}

fn document() -> impl Strategy<Value = ConfigDocument> {
    let key = prop::sample::select(vec!["a", "b", "c", "d.e"]);
    prop::collection::vec((prop::collection::vec(key, 1..4), leaf_value()), 0..6).prop_map(
        |entries| {
            let mut root = Map::new();
            for (path, value) in entries {
                set_path(&mut root, &path, value);
            }
            ConfigDocument::new(root)
        },
    )
}

fn sources() -> impl Strategy<Value = (Vec<ConfigDocument>, ConfigDocument)> {
    (prop::collection::vec(document(), 1..5), document())
}

fn build<'a>(pairs: impl Iterator<Item = (&'a SourceId, &'a ConfigDocument)>) -> AggregationTree {
    let mut tree = AggregationTree::new();
    for (source, doc) in pairs {
        tree.insert(source, doc).unwrap();
    }
    tree
}

fn tagged(devices: &[ConfigDocument], group: &ConfigDocument) -> Vec<(SourceId, ConfigDocument)> {
    devices
        .iter()
        .enumerate()
        .map(|(i, d)| (SourceId::device(i.to_string()), d.clone()))
        .chain(std::iter::once((SourceId::Group, group.clone())))
        .collect()
}

proptest! {
    #[test]
    fn prop_sorted_flatten_ignores_insertion_order((devices, group) in sources()) {
        let pairs = tagged(&devices, &group);
        let forward = build(pairs.iter().map(|(s, d)| (s, d)));
        let backward = build(pairs.iter().rev().map(|(s, d)| (s, d)));

        let options = FlattenOptions::default().with_order(ChildOrder::Sorted);
        prop_assert_eq!(
            flatten_with(&forward, None, options),
            flatten_with(&backward, None, options)
        );

        // Insertion order may differ, but the rows are the same
        let rows = |t: &AggregationTree| {
            let data = flatten(t, None);
            let mut rows: Vec<_> = data
                .rows()
                .map(|r| (r.id.to_string(), r.parent.to_string(), r.label.to_string(), r.value))
                .collect();
            rows.sort();
            rows
        };
        prop_assert_eq!(rows(&forward), rows(&backward));
    }

    #[test]
    fn prop_ids_unique_and_parents_declared_first((devices, group) in sources()) {
        let pairs = tagged(&devices, &group);
        let tree = build(pairs.iter().map(|(s, d)| (s, d)));
        let data = flatten(&tree, None);

        prop_assert_eq!(data.ids.len(), data.parents.len());
        prop_assert_eq!(data.ids.len(), data.labels.len());
        prop_assert_eq!(data.ids.len(), data.values.len());

        let mut seen = HashSet::new();
        for (i, row) in data.rows().enumerate() {
            if i == 0 {
                prop_assert_eq!(row.parent, "");
            } else {
                prop_assert!(seen.contains(row.parent), "parent {} of {} not declared", row.parent, row.id);
            }
            prop_assert!(seen.insert(row.id.to_string()), "duplicate id {}", row.id);
        }
        prop_assert_eq!(data.len(), tree.iter().count());
    }

    #[test]
    fn prop_lookup_round_trips((devices, group) in sources()) {
        let pairs = tagged(&devices, &group);
        let tree = build(pairs.iter().map(|(s, d)| (s, d)));
        for id in flatten(&tree, None).ids {
            let node = tree.lookup(&id).unwrap();
            prop_assert_eq!(node.path().to_string(), id);
        }
    }

    #[test]
    fn prop_group_exclusion_subtracts_one((devices, group) in sources()) {
        let pairs = tagged(&devices, &group);
        let tree = build(pairs.iter().map(|(s, d)| (s, d)));
        let plain = flatten(&tree, None);
        let filtered = flatten(&tree, Some(&ExcludeGroup));

        prop_assert_eq!(&plain.ids, &filtered.ids);
        for (i, id) in plain.ids.iter().enumerate().skip(1) {
            let node = tree.lookup(id).unwrap();
            let expected = plain.values[i] - usize::from(node.contains_source(&SourceId::Group));
            prop_assert_eq!(filtered.values[i], expected);
        }
    }

    #[test]
    fn prop_top_level_counts_match_documents((devices, group) in sources()) {
        let pairs = tagged(&devices, &group);
        let tree = build(pairs.iter().map(|(s, d)| (s, d)));

        for node in tree.root().children() {
            let holders: BTreeSet<_> = pairs
                .iter()
                .filter(|(_, d)| d.as_map().contains_key(node.label()))
                .map(|(s, _)| s.clone())
                .collect();
            prop_assert_eq!(node.sources(), &holders);
        }
    }

    #[test]
    fn prop_true_never_becomes_a_value(doc in document()) {
        let mut tree = AggregationTree::new();
        tree.insert(&SourceId::device("x"), &doc).unwrap();
        for node in tree.iter().filter(|n| n.kind() == NodeKind::Value) {
            prop_assert_ne!(node.label(), "true");
        }
    }
}
