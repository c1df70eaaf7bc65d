//! Legacy domain listing.
//!
//! Running domains are listed by numeric ID, which the backend reassigns on
//! every power cycle. Defined but stopped domains are listed by name. A
//! previous record is matched by the identity its own state implies (ID if
//! it was running, name otherwise), never by the key it was stored under.
//! A domain that changed state is therefore reported as removed under its
//! old identity and new under the current one.

use std::collections::HashMap;

use tracing::debug;

use super::listed;
use crate::backend::{DomainRecord, DomainSource, Named};
use crate::error::{BackendResult, PollError, Result};
use crate::reconcile::{Pass, Unclaimed};
use crate::snapshot::{Partition, Snapshot};

/// Previous domain records indexed by the identity their state implies.
struct DomainIndex<R> {
    remaining: Unclaimed<R>,
    by_id: HashMap<u32, String>,
    by_name: HashMap<String, String>,
}

impl<R: DomainRecord> DomainIndex<R> {
    fn new(previous: Snapshot<R>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();

        for (key, record) in previous.iter() {
            if record.is_active() {
                let id = record.id().ok_or_else(|| PollError::MissingDomainId {
                    key: key.to_string(),
                })?;
                if let Some(first) = by_id.insert(id, key.to_string()) {
                    return Err(PollError::DuplicateDomainIdentity {
                        first,
                        second: key.to_string(),
                        identity: format!("id {}", id),
                    });
                }
            } else if let Some(first) = by_name.insert(record.name().to_string(), key.to_string()) {
                return Err(PollError::DuplicateDomainIdentity {
                    first,
                    second: key.to_string(),
                    identity: format!("name '{}'", record.name()),
                });
            }
        }

        Ok(Self {
            remaining: Unclaimed::from(previous),
            by_id,
            by_name,
        })
    }

    fn claim_active(&mut self, id: u32) -> Option<R> {
        let key = self.by_id.get(&id)?;
        self.remaining.claim(key)
    }

    fn claim_inactive(&mut self, name: &str) -> Option<R> {
        let key = self.by_name.get(name)?;
        self.remaining.claim(key)
    }
}

/// Poll domains through the split listing.
///
/// Running domains are keyed by their decimal ID, stopped ones by name.
/// Fails only when `previous` itself is inconsistent: an active record
/// without an ID, or two records claiming one identity.
pub fn poll_domains_split<S, R, B>(
    source: &S,
    previous: Snapshot<R>,
    mut build: B,
) -> Result<Partition<R>>
where
    S: DomainSource + ?Sized,
    R: Clone + DomainRecord,
    B: FnMut(S::Handle, &str) -> BackendResult<R>,
{
    let kind = source.kind();
    let mut index = DomainIndex::new(previous)?;

    let active_ids = listed(kind, "active", source.list_active_ids());
    let inactive_names = listed(kind, "inactive", source.list_inactive());

    let mut pass = Pass::new(kind);

    for id in active_ids {
        let key = id.to_string();
        if pass.seen(&key) {
            continue;
        }
        if let Some(record) = index.claim_active(id) {
            pass.retain(key, record);
            continue;
        }
        // Started since the last poll, or brand new.
        let built = source.lookup_by_id(id).and_then(|handle| {
            let name = handle.name()?;
            debug!(kind = %kind, id, name = %name, "Observed running domain");
            build(handle, &key)
        });
        pass.observe(key, built)?;
    }

    for name in inactive_names {
        if pass.seen(&name) {
            continue;
        }
        if let Some(record) = index.claim_inactive(&name) {
            pass.retain(name, record);
            continue;
        }
        // Stopped since the last poll, or newly defined.
        let built = source
            .lookup_by_name(&name)
            .and_then(|handle| build(handle, &name));
        pass.observe(name, built)?;
    }

    Ok(pass.finish(index.remaining.into_remaining()))
}
