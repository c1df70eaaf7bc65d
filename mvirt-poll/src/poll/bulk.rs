//! Modern bulk listing.

use tracing::debug;

use super::listed;
use crate::backend::{Named, ObjectSource};
use crate::error::{BackendResult, PollError, Result};
use crate::reconcile::reconcile;
use crate::snapshot::{Partition, Snapshot};

/// Fetch every object of the source's kind in one call.
///
/// A failing call yields an empty listing, which reconciles to "everything
/// removed". Callers cannot tell that apart from a truly empty backend.
pub fn list_bulk<S>(source: &S) -> Vec<S::Handle>
where
    S: ObjectSource + ?Sized,
{
    listed(source.kind(), "all", source.list_all())
}

/// Poll one kind through the bulk listing, keyed by object name.
pub fn poll_bulk<S, R, B>(source: &S, previous: Snapshot<R>, build: B) -> Result<Partition<R>>
where
    S: ObjectSource + ?Sized,
    R: Clone,
    B: FnMut(S::Handle, &str) -> BackendResult<R>,
{
    let kind = source.kind();
    let mut fresh = Vec::new();

    for handle in list_bulk(source) {
        match handle.name() {
            Ok(name) => fresh.push((name, handle)),
            Err(e) if e.is_fatal() => {
                return Err(PollError::Backend {
                    kind,
                    key: "<unnamed>".to_string(),
                    source: e,
                });
            }
            Err(e) => debug!(kind = %kind, "Skipping unnamed {}: {}", kind, e),
        }
    }

    reconcile(kind, previous, fresh, build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Connection;
    use crate::kind::ResourceKind;
    use crate::memory::{BackendState, MemoryBackend, MemoryHandle};

    fn build(handle: MemoryHandle, key: &str) -> BackendResult<String> {
        assert_eq!(handle.name, key);
        Ok(key.to_string())
    }

    #[test]
    fn test_poll_bulk_lists_active_and_inactive() {
        let backend = MemoryBackend::new(
            BackendState::new()
                .with_bulk_listing()
                .network("default", true)
                .network("isolated", false),
        );

        let partition = poll_bulk(&backend.networks(), Snapshot::new(), build).unwrap();
        assert_eq!(partition.new, vec!["default", "isolated"]);
        assert!(partition.removed.is_empty());
    }

    #[test]
    fn test_poll_bulk_listing_failure_removes_everything() {
        let mut state = BackendState::new().with_bulk_listing().network("a", true);
        state.failures.list_all.insert(ResourceKind::Network);
        let backend = MemoryBackend::new(state);
        let previous: Snapshot<String> = [("a", "a".to_string()), ("b", "b".to_string())]
            .into_iter()
            .collect();

        let partition = poll_bulk(&backend.networks(), previous, build).unwrap();
        assert_eq!(partition.removed, vec!["a", "b"]);
        assert!(partition.new.is_empty());
        assert!(partition.current.is_empty());
    }

    #[test]
    fn test_poll_bulk_skips_unnamed_handle() {
        let mut state = BackendState::new()
            .with_bulk_listing()
            .interface("eth0", true)
            .interface("eth1", true);
        state.failures.name.insert("eth0".to_string());
        let backend = MemoryBackend::new(state);

        let partition = poll_bulk(&backend.interfaces(), Snapshot::new(), build).unwrap();
        assert_eq!(partition.new, vec!["eth1"]);
        assert_eq!(partition.current.len(), 1);
    }
}
