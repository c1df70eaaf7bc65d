//! In-memory backend.
//!
//! Serves a [`BackendState`] through the [`Connection`] traits, with
//! per-call failure injection. The state deserializes from the JSON
//! fixtures the replay tool reads.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::backend::{Connection, DomainSource, Named, ObjectSource};
use crate::error::{BackendError, BackendResult};
use crate::kind::ResourceKind;

fn default_active() -> bool {
    true
}

/// A network, interface, node device or volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A storage pool and its volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub volumes: Vec<ObjectSpec>,
}

/// A domain; running while it has an ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    #[serde(default)]
    pub id: Option<u32>,
}

/// Calls that should fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePlan {
    pub list_all: HashSet<ResourceKind>,
    pub list_active: HashSet<ResourceKind>,
    pub list_inactive: HashSet<ResourceKind>,
    /// Names, or decimal domain IDs, whose lookup fails.
    pub lookup: HashSet<String>,
    /// Names whose handle fails to report its name.
    pub name: HashSet<String>,
}

/// Everything the backend reports at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendState {
    /// Kinds whose bulk listing API is available.
    pub bulk: HashSet<ResourceKind>,
    pub networks: Vec<ObjectSpec>,
    pub storage_pools: Vec<PoolSpec>,
    pub interfaces: Vec<ObjectSpec>,
    pub node_devices: Vec<ObjectSpec>,
    pub domains: Vec<DomainSpec>,
    pub failures: FailurePlan,
}

impl BackendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable bulk listing for every kind.
    pub fn with_bulk_listing(mut self) -> Self {
        self.bulk = ResourceKind::ALL.into_iter().collect();
        self
    }

    pub fn network(mut self, name: &str, active: bool) -> Self {
        self.networks.push(ObjectSpec {
            name: name.to_string(),
            active,
        });
        self
    }

    pub fn interface(mut self, name: &str, active: bool) -> Self {
        self.interfaces.push(ObjectSpec {
            name: name.to_string(),
            active,
        });
        self
    }

    pub fn node_device(mut self, name: &str) -> Self {
        self.node_devices.push(ObjectSpec {
            name: name.to_string(),
            active: true,
        });
        self
    }

    pub fn pool(mut self, name: &str, active: bool, volumes: &[&str]) -> Self {
        self.storage_pools.push(PoolSpec {
            name: name.to_string(),
            active,
            volumes: volumes
                .iter()
                .map(|v| ObjectSpec {
                    name: v.to_string(),
                    active: true,
                })
                .collect(),
        });
        self
    }

    pub fn domain(mut self, name: &str, id: Option<u32>) -> Self {
        self.domains.push(DomainSpec {
            name: name.to_string(),
            id,
        });
        self
    }
}

/// Raw handle handed out by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHandle {
    pub kind: ResourceKind,
    pub name: String,
    pub active: bool,
    pub id: Option<u32>,
    name_fails: bool,
}

impl Named for MemoryHandle {
    fn name(&self) -> BackendResult<String> {
        if self.name_fails {
            return Err(BackendError::Call(format!(
                "{} handle lost its name",
                self.kind
            )));
        }
        Ok(self.name.clone())
    }
}

/// Backend serving a [`BackendState`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: BackendState,
}

impl MemoryBackend {
    pub fn new(state: BackendState) -> Self {
        Self { state }
    }

    /// Current ID of the named domain; `None` while stopped or undefined.
    pub fn domain_id(&self, name: &str) -> Option<u32> {
        self.state
            .domains
            .iter()
            .find(|d| d.name == name)
            .and_then(|d| d.id)
    }

    /// Swap in the state for the next poll.
    pub fn set_state(&mut self, state: BackendState) {
        self.state = state;
    }

    fn handle(
        &self,
        kind: ResourceKind,
        name: &str,
        active: bool,
        id: Option<u32>,
    ) -> MemoryHandle {
        MemoryHandle {
            kind,
            name: name.to_string(),
            active,
            id,
            name_fails: self.state.failures.name.contains(name),
        }
    }

    fn objects(&self, kind: ResourceKind, specs: &[ObjectSpec]) -> Vec<MemoryHandle> {
        specs
            .iter()
            .map(|o| self.handle(kind, &o.name, o.active, None))
            .collect()
    }

    fn source(&self, kind: ResourceKind, objects: Vec<MemoryHandle>) -> MemorySource<'_> {
        MemorySource {
            kind,
            objects,
            bulk: self.state.bulk.contains(&kind),
            failures: &self.state.failures,
        }
    }
}

/// One kind's objects in a [`MemoryBackend`].
pub struct MemorySource<'a> {
    kind: ResourceKind,
    objects: Vec<MemoryHandle>,
    bulk: bool,
    failures: &'a FailurePlan,
}

impl MemorySource<'_> {
    fn fail(&self, call: &str) -> BackendError {
        BackendError::Call(format!("injected failure: {} {}", call, self.kind))
    }

    fn names(&self, active: bool) -> Vec<String> {
        self.objects
            .iter()
            .filter(|o| o.active == active)
            .map(|o| o.name.clone())
            .collect()
    }

    fn find(
        &self,
        key: &str,
        matches: impl Fn(&MemoryHandle) -> bool,
    ) -> BackendResult<MemoryHandle> {
        if self.failures.lookup.contains(key) {
            return Err(self.fail("lookup"));
        }
        self.objects
            .iter()
            .find(|&o| matches(o))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                kind: self.kind,
                key: key.to_string(),
            })
    }
}

impl ObjectSource for MemorySource<'_> {
    type Handle = MemoryHandle;

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn supports_list_all(&self) -> bool {
        self.bulk
    }

    fn list_all(&self) -> BackendResult<Vec<MemoryHandle>> {
        trace!(kind = %self.kind, "list_all");
        if !self.bulk {
            return Err(BackendError::Unsupported(format!("listing all {}s", self.kind)));
        }
        if self.failures.list_all.contains(&self.kind) {
            return Err(self.fail("list all"));
        }
        Ok(self.objects.clone())
    }

    fn list_active(&self) -> BackendResult<Vec<String>> {
        if self.failures.list_active.contains(&self.kind) {
            return Err(self.fail("list active"));
        }
        Ok(self.names(true))
    }

    fn list_inactive(&self) -> BackendResult<Vec<String>> {
        if !self.kind.has_inactive_listing() {
            return Ok(Vec::new());
        }
        if self.failures.list_inactive.contains(&self.kind) {
            return Err(self.fail("list inactive"));
        }
        Ok(self.names(false))
    }

    fn lookup_by_name(&self, name: &str) -> BackendResult<MemoryHandle> {
        self.find(name, |o| o.name == name)
    }
}

impl DomainSource for MemorySource<'_> {
    fn list_active_ids(&self) -> BackendResult<Vec<u32>> {
        if self.failures.list_active.contains(&self.kind) {
            return Err(self.fail("list active"));
        }
        Ok(self.objects.iter().filter_map(|o| o.id).collect())
    }

    fn lookup_by_id(&self, id: u32) -> BackendResult<MemoryHandle> {
        self.find(&id.to_string(), |o| o.id == Some(id))
    }
}

impl Connection for MemoryBackend {
    type Network = MemoryHandle;
    type StoragePool = MemoryHandle;
    type StorageVolume = MemoryHandle;
    type Interface = MemoryHandle;
    type NodeDevice = MemoryHandle;
    type Domain = MemoryHandle;

    fn networks(&self) -> impl ObjectSource<Handle = MemoryHandle> + '_ {
        let objects = self.objects(ResourceKind::Network, &self.state.networks);
        self.source(ResourceKind::Network, objects)
    }

    fn storage_pools(&self) -> impl ObjectSource<Handle = MemoryHandle> + '_ {
        let objects = self
            .state
            .storage_pools
            .iter()
            .map(|p| self.handle(ResourceKind::StoragePool, &p.name, p.active, None))
            .collect();
        self.source(ResourceKind::StoragePool, objects)
    }

    fn storage_volumes<'a>(
        &'a self,
        pool: &'a MemoryHandle,
    ) -> impl ObjectSource<Handle = MemoryHandle> + 'a {
        let objects = self
            .state
            .storage_pools
            .iter()
            .find(|p| p.name == pool.name)
            .map(|p| self.objects(ResourceKind::StorageVolume, &p.volumes))
            .unwrap_or_default();
        self.source(ResourceKind::StorageVolume, objects)
    }

    fn interfaces(&self) -> impl ObjectSource<Handle = MemoryHandle> + '_ {
        let objects = self.objects(ResourceKind::Interface, &self.state.interfaces);
        self.source(ResourceKind::Interface, objects)
    }

    fn node_devices(&self) -> impl ObjectSource<Handle = MemoryHandle> + '_ {
        let objects = self.objects(ResourceKind::NodeDevice, &self.state.node_devices);
        self.source(ResourceKind::NodeDevice, objects)
    }

    fn domains(&self) -> impl DomainSource<Handle = MemoryHandle> + '_ {
        let objects = self
            .state
            .domains
            .iter()
            .map(|d| self.handle(ResourceKind::Domain, &d.name, d.id.is_some(), d.id))
            .collect();
        self.source(ResourceKind::Domain, objects)
    }
}
