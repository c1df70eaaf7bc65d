//! mvirt-poll: incremental inventory reconciliation.
//!
//! Keeps an in-memory view of backend objects (networks, storage pools and
//! volumes, interfaces, node devices, domains) in sync with the backend, one
//! poll at a time. Each poll takes the previous [`Snapshot`] of a kind and
//! returns a [`Partition`]: records that disappeared, records built for
//! newly observed objects, and the current snapshot for the next poll.
//!
//! Backends either list everything in one call or, on older versions,
//! list active and inactive names separately and need a lookup per object.
//! Domains on the legacy path are listed by numeric ID while running.
//!
//! Listing failures degrade to an empty listing. A failed lookup or build
//! skips that object until the next poll. Only internal invariant
//! violations abort a poll with [`PollError`].

pub mod backend;
pub mod config;
pub mod error;
pub mod kind;
pub mod memory;
pub mod poll;
pub mod reconcile;
pub mod snapshot;

pub use backend::{Connection, DomainRecord, DomainSource, Named, ObjectSource};
pub use config::PollConfig;
pub use error::{BackendError, BackendResult, PollError, Result};
pub use kind::ResourceKind;
pub use poll::{
    ListingStrategy, Polled, fetch_domains, fetch_interfaces, fetch_networks, fetch_node_devices,
    fetch_storage_pools, fetch_storage_volumes, poll_domains, poll_objects,
};
pub use reconcile::reconcile;
pub use snapshot::{Partition, Snapshot};
