//! Domain types for the Corral state store.
//!
//! These records mirror the platform relations the allocator reads:
//! hosts and their agents, storage pools and pool-host mappings,
//! instances and instance-host mappings, ports, and service exposures.
//! All types are serializable to/from JSON for storage in redb tables.
//!
//! Soft deletion: every record carries `removed`, a unix-seconds
//! tombstone. A record is live while `removed` is `None`; queries in the
//! allocator only consider live rows.

use serde::{Deserialize, Serialize};

/// Unique identifier for a host.
pub type HostId = u64;

/// Unique identifier for an agent.
pub type AgentId = u64;

/// Unique identifier for an account.
pub type AccountId = u64;

/// Unique identifier for a storage pool.
pub type PoolId = u64;

/// Unique identifier for an instance.
pub type InstanceId = u64;

/// Unique identifier for a service.
pub type ServiceId = u64;

/// Unique identifier for a storage volume.
pub type VolumeId = u64;

// ── States ────────────────────────────────────────────────────────

/// Lifecycle state shared by hosts, agents, and storage pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Active,
    UpdatingActive,
    Inactive,
}

/// Runtime state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceRunState {
    Starting,
    Restarting,
    Running,
    Stopping,
    Stopped,
}

impl InstanceRunState {
    /// True for states that keep the instance's port bindings claimed.
    pub fn holds_ports(self) -> bool {
        matches!(self, Self::Starting | Self::Restarting | Self::Running)
    }
}

// ── Host / agent ──────────────────────────────────────────────────

/// A machine that can run instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostRecord {
    pub id: HostId,
    /// Stable external identifier, exposed to callers and ordering lists.
    pub uuid: String,
    pub account_id: AccountId,
    /// Agent managing this host, if one is registered.
    pub agent_id: Option<AgentId>,
    /// Host kind, e.g. "docker".
    pub kind: String,
    pub state: ResourceState,
    /// Unix timestamp of soft deletion, `None` while live.
    pub removed: Option<u64>,
}

/// The agent process managing a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub id: AgentId,
    pub state: ResourceState,
    pub removed: Option<u64>,
}

// ── Storage pools ─────────────────────────────────────────────────

/// A storage pool usable by instances on one or more hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoragePoolRecord {
    pub id: PoolId,
    /// Pool kind, matched against the host kind when kind-filtering.
    pub kind: String,
    pub state: ResourceState,
    pub removed: Option<u64>,
}

/// Association between a storage pool and a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoragePoolHostMap {
    pub storage_pool_id: PoolId,
    pub host_id: HostId,
    pub removed: Option<u64>,
}

// ── Instances ─────────────────────────────────────────────────────

/// A workload instance and its declared resource reservations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub account_id: AccountId,
    pub state: InstanceRunState,
    /// Declared memory reservation in bytes, if any.
    pub memory_reservation: Option<u64>,
    /// Declared CPU reservation in milli-cores, if any.
    pub milli_cpu_reservation: Option<u64>,
    pub removed: Option<u64>,
}

/// Association between an instance and the host it runs on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceHostMap {
    pub instance_id: InstanceId,
    pub host_id: HostId,
    pub removed: Option<u64>,
}

// ── Ports ─────────────────────────────────────────────────────────

/// A port binding declared by an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRecord {
    pub id: u64,
    pub instance_id: InstanceId,
    pub private_port: u16,
    pub public_port: u16,
    /// Address the public port binds to; `None` means all interfaces.
    pub bind_address: Option<String>,
    pub removed: Option<u64>,
}

// ── Service exposures ─────────────────────────────────────────────

/// Association between a service and an instance exposing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceExposeMap {
    pub service_id: ServiceId,
    pub instance_id: InstanceId,
    /// True while the exposure is part of an in-flight rolling upgrade.
    #[serde(default)]
    pub upgrade: bool,
    pub removed: Option<u64>,
}

impl HostRecord {
    /// True while the record has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.removed.is_none()
    }
}

impl StoragePoolHostMap {
    /// Build the composite key for the pool-host map table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.storage_pool_id, self.host_id)
    }
}

impl InstanceHostMap {
    /// Build the composite key for the instance-host map table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.instance_id, self.host_id)
    }
}

impl PortRecord {
    /// Build the composite key for the ports table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.instance_id, self.id)
    }
}

impl ServiceExposeMap {
    /// Build the composite key for the service exposure table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.instance_id, self.service_id)
    }
}
