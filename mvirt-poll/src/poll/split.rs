//! Legacy split listing: active and inactive names, then per-name lookup.

use super::listed;
use crate::backend::ObjectSource;
use crate::error::{BackendResult, Result};
use crate::reconcile::reconcile;
use crate::snapshot::{Partition, Snapshot};

/// Names of active objects followed by names of inactive ones.
///
/// Either listing failing is treated as empty.
pub fn list_split<S>(source: &S) -> Vec<String>
where
    S: ObjectSource + ?Sized,
{
    let kind = source.kind();
    let mut names = listed(kind, "active", source.list_active());
    names.extend(listed(kind, "inactive", source.list_inactive()));
    names
}

/// Poll one kind through the split listing.
///
/// Known names are retained without touching the backend. Only names
/// missing from `previous` are looked up and built.
pub fn poll_split<S, R, B>(source: &S, previous: Snapshot<R>, mut build: B) -> Result<Partition<R>>
where
    S: ObjectSource + ?Sized,
    R: Clone,
    B: FnMut(S::Handle, &str) -> BackendResult<R>,
{
    let fresh = list_split(source).into_iter().map(|name| (name, ()));

    reconcile(source.kind(), previous, fresh, |(), name| {
        let handle = source.lookup_by_name(name)?;
        build(handle, name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Connection;
    use crate::kind::ResourceKind;
    use crate::memory::{BackendState, MemoryBackend};
    use std::cell::Cell;

    #[test]
    fn test_poll_split_looks_up_unknown_names_only() {
        let backend = MemoryBackend::new(
            BackendState::new()
                .network("default", true)
                .network("isolated", false)
                .network("lab", false),
        );
        let previous: Snapshot<String> = [("default", "default".to_string())].into_iter().collect();
        let built = Cell::new(0);

        let partition = poll_split(&backend.networks(), previous, |handle, key| {
            built.set(built.get() + 1);
            assert_eq!(handle.name, key);
            Ok(key.to_string())
        })
        .unwrap();

        assert_eq!(built.get(), 2);
        assert_eq!(partition.new, vec!["isolated", "lab"]);
        assert_eq!(
            partition.current.keys().collect::<Vec<_>>(),
            vec!["default", "isolated", "lab"]
        );
    }

    #[test]
    fn test_poll_split_failed_lookup_is_skipped() {
        let mut state = BackendState::new()
            .network("a", true)
            .network("b", true)
            .network("c", false);
        state.failures.lookup.insert("b".to_string());
        let backend = MemoryBackend::new(state);

        let partition =
            poll_split(&backend.networks(), Snapshot::new(), |_, key| Ok(key.to_string())).unwrap();

        assert_eq!(partition.new, vec!["a", "c"]);
        assert!(!partition.current.contains_key("b"));
        assert!(partition.removed.is_empty());
    }

    #[test]
    fn test_poll_split_inactive_failure_drops_inactive() {
        let mut state = BackendState::new().network("a", true).network("b", false);
        state.failures.list_inactive.insert(ResourceKind::Network);
        let backend = MemoryBackend::new(state);
        let previous: Snapshot<String> = [("a", "a".to_string()), ("b", "b".to_string())]
            .into_iter()
            .collect();

        let partition =
            poll_split(&backend.networks(), previous, |_, key| Ok(key.to_string())).unwrap();

        assert_eq!(partition.removed, vec!["b"]);
        assert!(partition.new.is_empty());
        assert_eq!(partition.current.keys().collect::<Vec<_>>(), vec!["a"]);
    }
}
