//! redb table definitions for the Corral state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Child relations use composite keys of the form
//! `{parent_id}:{child_id}` so per-parent lookups are prefix scans.

use redb::TableDefinition;

/// Host records keyed by `{host_id}`.
pub const HOSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("hosts");

/// Agent records keyed by `{agent_id}`.
pub const AGENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("agents");

/// Storage pool records keyed by `{pool_id}`.
pub const STORAGE_POOLS: TableDefinition<&str, &[u8]> = TableDefinition::new("storage_pools");

/// Pool-host mappings keyed by `{pool_id}:{host_id}`.
pub const POOL_HOST_MAPS: TableDefinition<&str, &[u8]> = TableDefinition::new("pool_host_maps");

/// Instance records keyed by `{instance_id}`.
pub const INSTANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("instances");

/// Instance-host mappings keyed by `{instance_id}:{host_id}`.
pub const INSTANCE_HOST_MAPS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("instance_host_maps");

/// Port records keyed by `{instance_id}:{port_id}`.
pub const PORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("ports");

/// Service exposure mappings keyed by `{instance_id}:{service_id}`.
pub const SERVICE_EXPOSE_MAPS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("service_expose_maps");
