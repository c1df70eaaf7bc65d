//! Property-based tests for the reconciliation pass.
//!
//! Uses proptest to validate, for arbitrary previous snapshots and listings:
//! - removed and current cover exactly the previous and observed keys
//! - no key lands in two outputs
//! - a second pass over the same listing changes nothing
//! - retained records are never rebuilt

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use mvirt_poll::memory::{BackendState, MemoryBackend, MemoryHandle};
use mvirt_poll::{
    BackendError, BackendResult, ListingStrategy, PollConfig, ResourceKind, Snapshot,
    fetch_networks, reconcile,
};
use proptest::prelude::*;

type Record = Arc<String>;

fn snapshot_of(keys: &BTreeSet<String>) -> Snapshot<Record> {
    keys.iter()
        .map(|k| (k.clone(), Arc::new(k.clone())))
        .collect()
}

fn keys(records: &[Record]) -> BTreeSet<String> {
    records.iter().map(|r| r.as_str().to_string()).collect()
}

fn key_strategy() -> impl Strategy<Value = String> {
    (0u8..12).prop_map(|n| format!("obj{}", n))
}

proptest! {
    /// Property: removed ∪ current = previous ∪ observed, removed ∩ current = ∅
    #[test]
    fn prop_partition_covers_keys(
        previous in prop::collection::btree_set(key_strategy(), 0..8),
        fresh in prop::collection::vec(key_strategy(), 0..16),
        failing in prop::collection::btree_set(key_strategy(), 0..3),
    ) {
        let listing = fresh.iter().map(|k| (k.clone(), ()));
        let partition = reconcile(ResourceKind::Network, snapshot_of(&previous), listing, |(), key| {
            if failing.contains(key) {
                Err(BackendError::Call("injected".to_string()))
            } else {
                Ok(Arc::new(key.to_string()))
            }
        })
        .unwrap();

        let fresh_set: BTreeSet<String> = fresh.iter().cloned().collect();
        let removed = keys(&partition.removed);
        let new = keys(&partition.new);
        let current: BTreeSet<String> = partition.current.keys().map(str::to_string).collect();

        let expected_removed: BTreeSet<String> = previous.difference(&fresh_set).cloned().collect();
        let expected_new: BTreeSet<String> = fresh_set
            .difference(&previous)
            .filter(|k| !failing.contains(*k))
            .cloned()
            .collect();
        let retained: BTreeSet<String> = previous.intersection(&fresh_set).cloned().collect();
        let expected_current: BTreeSet<String> = retained.union(&expected_new).cloned().collect();

        prop_assert_eq!(&removed, &expected_removed);
        prop_assert_eq!(&new, &expected_new);
        prop_assert_eq!(&current, &expected_current);
        prop_assert!(removed.is_disjoint(&current));
        prop_assert_eq!(partition.new.len(), new.len());
        prop_assert_eq!(partition.removed.len(), removed.len());
    }

    /// Property: a second pass over the same listing reports nothing
    #[test]
    fn prop_second_pass_is_idempotent(
        previous in prop::collection::btree_set(key_strategy(), 0..8),
        fresh in prop::collection::vec(key_strategy(), 0..16),
    ) {
        let build = |(), key: &str| -> BackendResult<Record> { Ok(Arc::new(key.to_string())) };
        let listing = || fresh.iter().map(|k| (k.clone(), ()));

        let first = reconcile(ResourceKind::Interface, snapshot_of(&previous), listing(), build).unwrap();
        let second = reconcile(ResourceKind::Interface, first.current.clone(), listing(), build).unwrap();

        prop_assert!(second.removed.is_empty());
        prop_assert!(second.new.is_empty());
        prop_assert_eq!(
            second.current.keys().collect::<Vec<_>>(),
            first.current.keys().collect::<Vec<_>>()
        );
    }

    /// Property: known keys keep their record, unknown keys are built once
    #[test]
    fn prop_builder_only_runs_for_unknown_keys(
        previous in prop::collection::btree_set(key_strategy(), 0..8),
        fresh in prop::collection::vec(key_strategy(), 0..16),
    ) {
        let snapshot = snapshot_of(&previous);
        let originals = snapshot.clone();
        let built = RefCell::new(Vec::new());

        let partition = reconcile(
            ResourceKind::NodeDevice,
            snapshot,
            fresh.iter().map(|k| (k.clone(), ())),
            |(), key| {
                built.borrow_mut().push(key.to_string());
                Ok(Arc::new(key.to_string()))
            },
        )
        .unwrap();

        let built = built.into_inner();
        let distinct_built: HashSet<&String> = built.iter().collect();
        prop_assert_eq!(distinct_built.len(), built.len());
        for key in &built {
            prop_assert!(!previous.contains(key));
        }

        for (key, record) in partition.current.iter() {
            if let Some(original) = originals.get(key) {
                prop_assert!(Arc::ptr_eq(record, original));
            }
        }
    }
}

fn track(handle: MemoryHandle, key: &str) -> BackendResult<Record> {
    assert_eq!(handle.name, key);
    Ok(Arc::new(key.to_string()))
}

proptest! {
    /// Property: bulk and split listings reconcile to the same keys
    #[test]
    fn prop_bulk_and_split_agree(
        objects in prop::collection::btree_map(key_strategy(), any::<bool>(), 0..10),
        previous in prop::collection::btree_set(key_strategy(), 0..8),
    ) {
        let mut state = BackendState::new().with_bulk_listing();
        for (name, active) in &objects {
            state = state.network(name, *active);
        }
        let backend = MemoryBackend::new(state);

        let bulk = fetch_networks(&backend, snapshot_of(&previous), track, &PollConfig::default())
            .unwrap();
        let split = fetch_networks(&backend, snapshot_of(&previous), track, &PollConfig::split_only())
            .unwrap();
        prop_assert_eq!(bulk.strategy, ListingStrategy::Bulk);
        prop_assert_eq!(split.strategy, ListingStrategy::Split);
        let (bulk, split) = (bulk.partition, split.partition);

        prop_assert_eq!(keys(&bulk.removed), keys(&split.removed));
        prop_assert_eq!(keys(&bulk.new), keys(&split.new));
        let bulk_current: BTreeSet<&str> = bulk.current.keys().collect();
        let split_current: BTreeSet<&str> = split.current.keys().collect();
        prop_assert_eq!(bulk_current, split_current);
    }
}
