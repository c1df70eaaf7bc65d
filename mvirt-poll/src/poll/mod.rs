//! Per-kind poll entry points.
//!
//! Each entry point probes the backend once for bulk listing support,
//! picks a [`ListingStrategy`] and runs one reconciliation pass:
//!
//! - `Bulk`: one "list all" call, keyed by name
//! - `Split`: active + inactive names, lookup for unknown names only
//! - `SplitById`: domains only, running domains keyed by numeric ID

pub mod bulk;
pub mod domain;
pub mod split;

use std::fmt;

use tracing::{debug, info};

use crate::backend::{Connection, DomainRecord, DomainSource, ObjectSource};
use crate::config::PollConfig;
use crate::error::{BackendResult, Result};
use crate::kind::ResourceKind;
use crate::snapshot::{Partition, Snapshot};

pub use bulk::{list_bulk, poll_bulk};
pub use domain::poll_domains_split;
pub use split::{list_split, poll_split};

/// How a kind is listed during one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStrategy {
    Bulk,
    Split,
    SplitById,
}

impl ListingStrategy {
    /// Resolve the strategy from the capability probe and config.
    pub fn select(kind: ResourceKind, supports_list_all: bool, config: &PollConfig) -> Self {
        if supports_list_all && config.allows_bulk() {
            ListingStrategy::Bulk
        } else if kind == ResourceKind::Domain {
            ListingStrategy::SplitById
        } else {
            ListingStrategy::Split
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStrategy::Bulk => "bulk",
            ListingStrategy::Split => "split",
            ListingStrategy::SplitById => "split-by-id",
        }
    }
}

impl fmt::Display for ListingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one poll: the path taken and what it found.
#[derive(Debug)]
pub struct Polled<R> {
    pub strategy: ListingStrategy,
    pub partition: Partition<R>,
}

/// Unwrap a listing call, logging and degrading to empty on failure.
pub(crate) fn listed<T>(kind: ResourceKind, which: &str, listing: BackendResult<Vec<T>>) -> Vec<T> {
    match listing {
        Ok(items) => items,
        Err(e) => {
            debug!(kind = %kind, "Unable to list {} {}s: {}", which, kind, e);
            Vec::new()
        }
    }
}

fn log_partition<R>(kind: ResourceKind, strategy: ListingStrategy, partition: &Partition<R>) {
    if partition.is_unchanged() {
        debug!(
            kind = %kind,
            strategy = %strategy,
            current = partition.current.len(),
            "Poll unchanged"
        );
    } else {
        info!(
            kind = %kind,
            strategy = %strategy,
            removed = partition.removed.len(),
            new = partition.new.len(),
            current = partition.current.len(),
            "Poll changed"
        );
    }
}

/// Poll a non-domain kind.
///
/// Domains passed here are listed by name only; use [`poll_domains`] for
/// ID-aware polling.
pub fn poll_objects<S, R, B>(
    source: &S,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    S: ObjectSource + ?Sized,
    R: Clone,
    B: FnMut(S::Handle, &str) -> BackendResult<R>,
{
    let kind = source.kind();
    let strategy = ListingStrategy::select(kind, source.supports_list_all(), config);

    let partition = match strategy {
        ListingStrategy::Bulk => poll_bulk(source, previous, build)?,
        ListingStrategy::Split | ListingStrategy::SplitById => poll_split(source, previous, build)?,
    };

    log_partition(kind, strategy, &partition);
    Ok(Polled {
        strategy,
        partition,
    })
}

/// Poll domains.
pub fn poll_domains<S, R, B>(
    source: &S,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    S: DomainSource + ?Sized,
    R: Clone + DomainRecord,
    B: FnMut(S::Handle, &str) -> BackendResult<R>,
{
    let kind = source.kind();
    let strategy = ListingStrategy::select(kind, source.supports_list_all(), config);

    let partition = match strategy {
        ListingStrategy::Bulk => poll_bulk(source, previous, build)?,
        _ => poll_domains_split(source, previous, build)?,
    };

    log_partition(kind, strategy, &partition);
    Ok(Polled {
        strategy,
        partition,
    })
}

pub fn fetch_networks<C, R, B>(
    conn: &C,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone,
    B: FnMut(C::Network, &str) -> BackendResult<R>,
{
    poll_objects(&conn.networks(), previous, build, config)
}

pub fn fetch_storage_pools<C, R, B>(
    conn: &C,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone,
    B: FnMut(C::StoragePool, &str) -> BackendResult<R>,
{
    poll_objects(&conn.storage_pools(), previous, build, config)
}

/// Poll the volumes of one storage pool. Each pool needs its own snapshot.
pub fn fetch_storage_volumes<C, R, B>(
    conn: &C,
    pool: &C::StoragePool,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone,
    B: FnMut(C::StorageVolume, &str) -> BackendResult<R>,
{
    poll_objects(&conn.storage_volumes(pool), previous, build, config)
}

pub fn fetch_interfaces<C, R, B>(
    conn: &C,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone,
    B: FnMut(C::Interface, &str) -> BackendResult<R>,
{
    poll_objects(&conn.interfaces(), previous, build, config)
}

pub fn fetch_node_devices<C, R, B>(
    conn: &C,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone,
    B: FnMut(C::NodeDevice, &str) -> BackendResult<R>,
{
    poll_objects(&conn.node_devices(), previous, build, config)
}

pub fn fetch_domains<C, R, B>(
    conn: &C,
    previous: Snapshot<R>,
    build: B,
    config: &PollConfig,
) -> Result<Polled<R>>
where
    C: Connection,
    R: Clone + DomainRecord,
    B: FnMut(C::Domain, &str) -> BackendResult<R>,
{
    poll_domains(&conn.domains(), previous, build, config)
}
