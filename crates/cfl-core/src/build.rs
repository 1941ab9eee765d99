//! Aggregation build over a [`ConfigSource`]

use crate::error::ServiceError;
use cfl_fetch::{ConfigSource, GroupId};
use cfl_tree::{AggregationTree, BooleanPolicy, TreeBuilder};

/// Fetch every document of `group` and merge them into a fresh tree
///
/// Device documents are requested `batch_size` ids at a time and inserted as
/// they arrive; the group document is inserted last.
///
/// # Errors
/// Returns the first fetch or build error; nothing is returned partially built
pub async fn build_tree(
    source: &dyn ConfigSource,
    group: &GroupId,
    policy: BooleanPolicy,
    batch_size: usize,
) -> Result<AggregationTree, ServiceError> {
    let device_ids = source.device_ids(group).await?;
    tracing::info!(group = %group, devices = device_ids.len(), "building aggregation tree");

    let mut builder = TreeBuilder::new(policy);
    for (index, batch) in device_ids.chunks(batch_size.max(1)).enumerate() {
        let documents = source.device_configurations(batch).await?;
        tracing::debug!(
            batch = index,
            requested = batch.len(),
            received = documents.len(),
            "device batch fetched"
        );
        for (device, document) in &documents {
            builder.add_device(device, document)?;
        }
    }

    let group_document = source.group_configuration(group).await?;
    builder.add_group(&group_document)?;

    tracing::info!(
        group = %group,
        devices = builder.device_count(),
        "aggregation tree built"
    );
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfl_test_utils::{doc, wifi_source, MemorySource};
    use cfl_tree::{flatten, SourceId};
    use serde_json::json;

    #[tokio::test]
    async fn devices_then_group() {
        let source = wifi_source();
        let tree = build_tree(&source, &GroupId::from(1), BooleanPolicy::default(), 100)
            .await
            .unwrap();
        let data = flatten(&tree, None);
        assert_eq!(data.values, vec![0, 3, 3, 2, 1]);
        assert!(tree.sources().contains(&SourceId::Group));
    }

    #[tokio::test]
    async fn devices_are_requested_in_batches() {
        let mut source = MemorySource::new(doc(json!({})));
        for i in 0..5 {
            source = source.with_device(&format!("{i}"), doc(json!({"n": i})));
        }
        build_tree(&source, &GroupId::from(1), BooleanPolicy::default(), 2)
            .await
            .unwrap();
        assert_eq!(source.batches(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn zero_batch_size_still_progresses() {
        let source = wifi_source();
        build_tree(&source, &GroupId::from(1), BooleanPolicy::default(), 0)
            .await
            .unwrap();
        assert_eq!(source.batches(), vec![1, 1]);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_build() {
        let source = wifi_source();
        source.set_failing(true);
        let err = build_tree(&source, &GroupId::from(1), BooleanPolicy::default(), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Fetch(_)));
    }
}
