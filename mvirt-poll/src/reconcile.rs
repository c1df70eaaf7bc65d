//! The reconciliation pass shared by every listing strategy.
//!
//! Previous records are claimed out of an unclaimed set as their keys
//! show up in the fresh listing. Whatever is still unclaimed once the
//! listing is exhausted has been removed from the backend.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{BackendResult, PollError, Result};
use crate::kind::ResourceKind;
use crate::snapshot::{Partition, Snapshot};

/// Previous records not yet matched by the fresh listing.
///
/// Claiming leaves a tombstone so lookups stay O(1) and the previous
/// snapshot order survives into the removed list.
pub(crate) struct Unclaimed<R> {
    slots: IndexMap<String, Option<R>>,
}

impl<R> Unclaimed<R> {
    /// Take the record stored under `key` out, if it is still unclaimed.
    pub(crate) fn claim(&mut self, key: &str) -> Option<R> {
        self.slots.get_mut(key).and_then(Option::take)
    }

    /// Records nobody claimed, in previous snapshot order.
    pub(crate) fn into_remaining(self) -> Vec<R> {
        self.slots.into_values().flatten().collect()
    }
}

impl<R> From<Snapshot<R>> for Unclaimed<R> {
    fn from(snapshot: Snapshot<R>) -> Self {
        Self {
            slots: snapshot
                .into_iter()
                .map(|(key, record)| (key, Some(record)))
                .collect(),
        }
    }
}

/// Accumulates the current and new records of one pass.
pub(crate) struct Pass<R> {
    kind: ResourceKind,
    current: Snapshot<R>,
    new: Vec<R>,
}

impl<R: Clone> Pass<R> {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            current: Snapshot::new(),
            new: Vec::new(),
        }
    }

    /// Whether `key` was already observed during this pass.
    pub(crate) fn seen(&self, key: &str) -> bool {
        self.current.contains_key(key)
    }

    /// Carry a previously known record forward unchanged.
    pub(crate) fn retain(&mut self, key: String, record: R) {
        self.current.insert(key, record);
    }

    /// Record the outcome of building an object not seen before.
    ///
    /// Non-fatal failures skip the key for this pass only: it ends up in
    /// none of the outputs and is retried on the next poll.
    pub(crate) fn observe(&mut self, key: String, built: BackendResult<R>) -> Result<()> {
        match built {
            Ok(record) => {
                self.new.push(record.clone());
                self.current.insert(key, record);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(PollError::Backend {
                kind: self.kind,
                key,
                source: e,
            }),
            Err(e) => {
                warn!(
                    kind = %self.kind,
                    key = %key,
                    "Couldn't fetch {} '{}': {}",
                    self.kind,
                    key,
                    e
                );
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self, removed: Vec<R>) -> Partition<R> {
        Partition {
            removed,
            new: self.new,
            current: self.current,
        }
    }
}

/// Reconcile `previous` against a fresh listing.
///
/// `fresh` yields `(key, raw)` in listing order. `materialize` turns the raw
/// item into a record and is only called for keys absent from `previous`.
/// A key listed twice is observed once.
pub fn reconcile<R, T, I, F>(
    kind: ResourceKind,
    previous: Snapshot<R>,
    fresh: I,
    mut materialize: F,
) -> Result<Partition<R>>
where
    R: Clone,
    I: IntoIterator<Item = (String, T)>,
    F: FnMut(T, &str) -> BackendResult<R>,
{
    let mut remaining = Unclaimed::from(previous);
    let mut pass = Pass::new(kind);

    for (key, raw) in fresh {
        if pass.seen(&key) {
            debug!(kind = %kind, key = %key, "Ignoring duplicate listing entry");
            continue;
        }
        if let Some(record) = remaining.claim(&key) {
            pass.retain(key, record);
            continue;
        }
        let built = materialize(raw, &key);
        pass.observe(key, built)?;
    }

    Ok(pass.finish(remaining.into_remaining()))
}
