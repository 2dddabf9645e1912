//! StateStore — redb-backed platform state for Corral.
//!
//! Provides typed reads and upserts over the relations the allocator
//! consumes. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends
//! (the latter for testing).
//!
//! The allocator only ever reads; the write side exists for the
//! surrounding platform and for test setup. Soft deletion is expressed
//! through the `removed` tombstone on each record, so there are no
//! delete operations here — a removed row is an upsert with `removed`
//! set.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(HOSTS).map_err(map_err!(Table))?;
        txn.open_table(AGENTS).map_err(map_err!(Table))?;
        txn.open_table(STORAGE_POOLS).map_err(map_err!(Table))?;
        txn.open_table(POOL_HOST_MAPS).map_err(map_err!(Table))?;
        txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(INSTANCE_HOST_MAPS).map_err(map_err!(Table))?;
        txn.open_table(PORTS).map_err(map_err!(Table))?;
        txn.open_table(SERVICE_EXPOSE_MAPS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic table plumbing ─────────────────────────────────────

    fn put<T: Serialize>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
        record: &T,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        prefix: Option<&str>,
    ) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if let Some(prefix) = prefix
                && !key.value().starts_with(prefix)
            {
                continue;
            }
            let record: T =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    // ── Hosts / agents ─────────────────────────────────────────────

    /// Insert or update a host record.
    pub fn put_host(&self, host: &HostRecord) -> StateResult<()> {
        self.put(HOSTS, &host.id.to_string(), host)?;
        debug!(host_id = host.id, uuid = %host.uuid, "host stored");
        Ok(())
    }

    /// Get a host by id.
    pub fn get_host(&self, host_id: HostId) -> StateResult<Option<HostRecord>> {
        self.get(HOSTS, &host_id.to_string())
    }

    /// Insert or update an agent record.
    pub fn put_agent(&self, agent: &AgentRecord) -> StateResult<()> {
        self.put(AGENTS, &agent.id.to_string(), agent)
    }

    /// Get an agent by id.
    pub fn get_agent(&self, agent_id: AgentId) -> StateResult<Option<AgentRecord>> {
        self.get(AGENTS, &agent_id.to_string())
    }

    // ── Storage pools ──────────────────────────────────────────────

    /// Insert or update a storage pool record.
    pub fn put_storage_pool(&self, pool: &StoragePoolRecord) -> StateResult<()> {
        self.put(STORAGE_POOLS, &pool.id.to_string(), pool)
    }

    /// Get a storage pool by id.
    pub fn get_storage_pool(&self, pool_id: PoolId) -> StateResult<Option<StoragePoolRecord>> {
        self.get(STORAGE_POOLS, &pool_id.to_string())
    }

    /// Insert or update a pool-host mapping.
    pub fn put_pool_host_map(&self, map: &StoragePoolHostMap) -> StateResult<()> {
        self.put(POOL_HOST_MAPS, &map.table_key(), map)
    }

    /// List all pool-host mappings, removed ones included.
    pub fn list_pool_host_maps(&self) -> StateResult<Vec<StoragePoolHostMap>> {
        self.scan(POOL_HOST_MAPS, None)
    }

    // ── Instances ──────────────────────────────────────────────────

    /// Insert or update an instance record.
    pub fn put_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
        self.put(INSTANCES, &instance.id.to_string(), instance)
    }

    /// Get an instance by id.
    pub fn get_instance(&self, instance_id: InstanceId) -> StateResult<Option<InstanceRecord>> {
        self.get(INSTANCES, &instance_id.to_string())
    }

    /// Insert or update an instance-host mapping.
    pub fn put_instance_host_map(&self, map: &InstanceHostMap) -> StateResult<()> {
        self.put(INSTANCE_HOST_MAPS, &map.table_key(), map)
    }

    /// List all instance-host mappings, removed ones included.
    pub fn list_instance_host_maps(&self) -> StateResult<Vec<InstanceHostMap>> {
        self.scan(INSTANCE_HOST_MAPS, None)
    }

    // ── Ports ──────────────────────────────────────────────────────

    /// Insert or update a port record.
    pub fn put_port(&self, port: &PortRecord) -> StateResult<()> {
        self.put(PORTS, &port.table_key(), port)
    }

    /// List all ports declared by an instance (by key prefix scan).
    pub fn ports_for_instance(&self, instance_id: InstanceId) -> StateResult<Vec<PortRecord>> {
        self.scan(PORTS, Some(&format!("{instance_id}:")))
    }

    // ── Service exposures ──────────────────────────────────────────

    /// Insert or update a service exposure mapping.
    pub fn put_service_expose_map(&self, map: &ServiceExposeMap) -> StateResult<()> {
        self.put(SERVICE_EXPOSE_MAPS, &map.table_key(), map)
    }

    /// List all service exposures of an instance (by key prefix scan).
    pub fn exposures_for_instance(
        &self,
        instance_id: InstanceId,
    ) -> StateResult<Vec<ServiceExposeMap>> {
        self.scan(SERVICE_EXPOSE_MAPS, Some(&format!("{instance_id}:")))
    }
}
