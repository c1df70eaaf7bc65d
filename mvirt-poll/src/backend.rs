//! Backend collaborator traits.
//!
//! A backend exposes one [`ObjectSource`] per resource kind. Each source
//! offers the modern bulk listing (when [`ObjectSource::supports_list_all`]
//! says so) and the legacy split listing: names of active and inactive
//! objects plus a per-name lookup. Domains add ID-based listing and lookup
//! through [`DomainSource`].
//!
//! Every call may fail independently. None of them is retried here.

use crate::error::BackendResult;
use crate::kind::ResourceKind;

/// A raw backend handle that can report its name.
pub trait Named {
    fn name(&self) -> BackendResult<String>;
}

/// Listing surface for one resource kind.
pub trait ObjectSource {
    /// Raw handle returned by listings and lookups.
    type Handle: Named;

    fn kind(&self) -> ResourceKind;

    /// Capability probe for the bulk listing API.
    fn supports_list_all(&self) -> bool;

    /// Bulk listing: every object of this kind in one call.
    fn list_all(&self) -> BackendResult<Vec<Self::Handle>>;

    /// Legacy listing: names of active objects.
    fn list_active(&self) -> BackendResult<Vec<String>>;

    /// Legacy listing: names of inactive (defined) objects.
    fn list_inactive(&self) -> BackendResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn lookup_by_name(&self, name: &str) -> BackendResult<Self::Handle>;
}

/// Domains are listed by numeric ID while running.
pub trait DomainSource: ObjectSource {
    /// Legacy listing: IDs of running domains.
    fn list_active_ids(&self) -> BackendResult<Vec<u32>>;

    fn lookup_by_id(&self, id: u32) -> BackendResult<Self::Handle>;
}

/// Record state the domain lister needs to re-derive a record's identity.
///
/// `is_active` and `id` must report the state observed by the previous
/// poll, not the state seen when the record was built. The bulk path never
/// rebuilds a retained record, so callers refresh the run state of every
/// record in `current` after each poll. A record left at its build-time
/// state claims the wrong domain once polling falls back to the ID listing.
pub trait DomainRecord {
    fn is_active(&self) -> bool;

    /// Numeric ID, present while the domain runs.
    fn id(&self) -> Option<u32>;

    fn name(&self) -> &str;
}

impl<T: DomainRecord + ?Sized> DomainRecord for std::sync::Arc<T> {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn id(&self) -> Option<u32> {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: DomainRecord + ?Sized> DomainRecord for std::rc::Rc<T> {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn id(&self) -> Option<u32> {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A connection to a management backend.
pub trait Connection {
    type Network: Named;
    type StoragePool: Named;
    type StorageVolume: Named;
    type Interface: Named;
    type NodeDevice: Named;
    type Domain: Named;

    fn networks(&self) -> impl ObjectSource<Handle = Self::Network> + '_;

    fn storage_pools(&self) -> impl ObjectSource<Handle = Self::StoragePool> + '_;

    /// Volumes of one storage pool.
    fn storage_volumes<'a>(
        &'a self,
        pool: &'a Self::StoragePool,
    ) -> impl ObjectSource<Handle = Self::StorageVolume> + 'a;

    fn interfaces(&self) -> impl ObjectSource<Handle = Self::Interface> + '_;

    fn node_devices(&self) -> impl ObjectSource<Handle = Self::NodeDevice> + '_;

    fn domains(&self) -> impl DomainSource<Handle = Self::Domain> + '_;
}
