//! Replays recorded backend states through the pollers.
//!
//! A fixture is an ordered list of [`BackendState`]s. Each one is served as
//! the backend for one tick, and every kind is reconciled against the
//! snapshot left by the previous tick.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use serde::Deserialize;
use tabled::Tabled;
use tracing::debug;

use mvirt_poll::memory::{BackendState, MemoryBackend, MemoryHandle};
use mvirt_poll::{
    BackendError, BackendResult, DomainRecord, ListingStrategy, Partition, PollConfig, Polled,
    ResourceKind, Snapshot, fetch_domains, fetch_interfaces, fetch_networks, fetch_node_devices,
    fetch_storage_pools, fetch_storage_volumes,
};

/// Recorded backend states, one per tick.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub ticks: Vec<BackendState>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

const NOT_RUNNING: i64 = -1;

/// Record kept for every tracked object.
///
/// The run state of a domain is re-read from the backend after each domain
/// poll; `handle` keeps what was seen at build time.
#[derive(Debug)]
pub struct Tracked {
    pub key: String,
    pub handle: MemoryHandle,
    running_id: AtomicI64,
}

impl Tracked {
    fn sync(&self, id: Option<u32>) {
        self.running_id.store(id.map_or(NOT_RUNNING, i64::from), Ordering::Relaxed);
    }
}

impl DomainRecord for Tracked {
    fn is_active(&self) -> bool {
        self.id().is_some()
    }

    fn id(&self) -> Option<u32> {
        u32::try_from(self.running_id.load(Ordering::Relaxed)).ok()
    }

    fn name(&self) -> &str {
        &self.handle.name
    }
}

type Record = Arc<Tracked>;

fn track(handle: MemoryHandle, key: &str) -> BackendResult<Record> {
    if key.is_empty() {
        return Err(BackendError::Invariant(format!(
            "{} built with an empty key",
            handle.kind
        )));
    }
    let running_id = AtomicI64::new(handle.id.map_or(NOT_RUNNING, i64::from));
    Ok(Arc::new(Tracked {
        key: key.to_string(),
        handle,
        running_id,
    }))
}

/// Changes to one kind (or one pool's volumes) during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct KindReport {
    #[tabled(rename = "KIND")]
    pub kind: String,
    #[tabled(rename = "LISTING")]
    pub strategy: String,
    #[tabled(rename = "REMOVED")]
    pub removed: String,
    #[tabled(rename = "NEW")]
    pub new: String,
    #[tabled(rename = "CURRENT")]
    pub current: usize,
}

impl KindReport {
    fn new(label: String, polled: &Polled<Record>) -> Self {
        Self::from_partition(label, polled.strategy, &polled.partition)
    }

    fn from_partition(
        label: String,
        strategy: ListingStrategy,
        partition: &Partition<Record>,
    ) -> Self {
        Self {
            kind: label,
            strategy: strategy.to_string(),
            removed: join_keys(&partition.removed),
            new: join_keys(&partition.new),
            current: partition.current.len(),
        }
    }

    /// Whether anything appeared or disappeared.
    pub fn changed(&self) -> bool {
        self.removed != "-" || self.new != "-"
    }
}

fn join_keys(records: &[Record]) -> String {
    if records.is_empty() {
        return "-".to_string();
    }
    records
        .iter()
        .map(|r| r.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Snapshots of every kind, carried from tick to tick.
pub struct Inventory {
    config: PollConfig,
    networks: Snapshot<Record>,
    pools: Snapshot<Record>,
    volumes: HashMap<String, Snapshot<Record>>,
    interfaces: Snapshot<Record>,
    node_devices: Snapshot<Record>,
    domains: Snapshot<Record>,
}

impl Inventory {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            networks: Snapshot::new(),
            pools: Snapshot::new(),
            volumes: HashMap::new(),
            interfaces: Snapshot::new(),
            node_devices: Snapshot::new(),
            domains: Snapshot::new(),
        }
    }

    #[cfg(test)]
    pub fn domains(&self) -> &Snapshot<Record> {
        &self.domains
    }

    /// Reconcile every kind against `conn`.
    pub fn refresh(&mut self, conn: &MemoryBackend) -> mvirt_poll::Result<Vec<KindReport>> {
        let config = self.config.clone();
        let mut reports = Vec::new();

        let networks = fetch_networks(conn, std::mem::take(&mut self.networks), track, &config)?;
        reports.push(KindReport::new(ResourceKind::Network.to_string(), &networks));
        self.networks = networks.partition.current;

        let pools = fetch_storage_pools(conn, std::mem::take(&mut self.pools), track, &config)?;
        reports.push(KindReport::new(ResourceKind::StoragePool.to_string(), &pools));
        self.pools = pools.partition.current;
        reports.extend(self.refresh_volumes(conn, &config)?);

        let interfaces =
            fetch_interfaces(conn, std::mem::take(&mut self.interfaces), track, &config)?;
        reports.push(KindReport::new(ResourceKind::Interface.to_string(), &interfaces));
        self.interfaces = interfaces.partition.current;

        let devices =
            fetch_node_devices(conn, std::mem::take(&mut self.node_devices), track, &config)?;
        reports.push(KindReport::new(ResourceKind::NodeDevice.to_string(), &devices));
        self.node_devices = devices.partition.current;

        let domains = fetch_domains(conn, std::mem::take(&mut self.domains), track, &config)?;
        reports.push(KindReport::new(ResourceKind::Domain.to_string(), &domains));
        self.domains = domains.partition.current;
        // Retained records keep the run state of this tick for the next poll.
        for record in self.domains.values() {
            record.sync(conn.domain_id(&record.handle.name));
        }

        Ok(reports)
    }

    /// Volumes are tracked per pool; a vanished pool takes its volumes along.
    fn refresh_volumes(
        &mut self,
        conn: &MemoryBackend,
        config: &PollConfig,
    ) -> mvirt_poll::Result<Vec<KindReport>> {
        let mut previous = std::mem::take(&mut self.volumes);
        let mut reports = Vec::new();

        for (pool_name, pool) in self.pools.iter() {
            let label = format!("{}[{}]", ResourceKind::StorageVolume, pool_name);
            let known = previous.remove(pool_name).unwrap_or_default();
            let volumes = fetch_storage_volumes(conn, &pool.handle, known, track, config)?;
            reports.push(KindReport::new(label, &volumes));
            self.volumes.insert(pool_name.to_string(), volumes.partition.current);
        }

        for (pool_name, orphaned) in previous {
            debug!(pool = %pool_name, volumes = orphaned.len(), "Dropping volumes of removed pool");
            let label = format!("{}[{}]", ResourceKind::StorageVolume, pool_name);
            let strategy = ListingStrategy::select(ResourceKind::StorageVolume, false, config);
            let partition = Partition::all_removed(orphaned);
            reports.push(KindReport::from_partition(label, strategy, &partition));
        }

        Ok(reports)
    }
}

/// Replay every tick of `fixture`, returning the reports per tick.
pub fn replay(fixture: Fixture, config: PollConfig) -> mvirt_poll::Result<Vec<Vec<KindReport>>> {
    let mut inventory = Inventory::new(config);
    let mut backend = MemoryBackend::default();
    let mut ticks = Vec::with_capacity(fixture.ticks.len());

    for state in fixture.ticks {
        backend.set_state(state);
        ticks.push(inventory.refresh(&backend)?);
    }

    Ok(ticks)
}
