//! Candidate query — joins hosts to their storage pools and evaluates
//! the compiled filter against each (host, pool) pair.
//!
//! The walk starts from live pool-host mappings (the inner join), pulls
//! the host and pool rows, and left-joins the host's agent. A host with
//! N eligible pools yields N rows; grouping happens downstream in the
//! assembler.

use tracing::debug;

use corral_state::{HostId, PoolId, StateStore};

use crate::error::AllocatorResult;
use crate::filter::HostFilter;

/// One (host, pool) pair satisfying the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPoolRow {
    pub host_uuid: String,
    pub host_id: HostId,
    pub pool_id: PoolId,
}

/// Fetch all (host, pool) rows matching the filter.
///
/// Removed mappings, hosts, and pools never contribute rows. An empty
/// result is valid; store failures propagate unmodified.
pub fn fetch_host_pool_rows(
    store: &StateStore,
    filter: &HostFilter,
) -> AllocatorResult<Vec<HostPoolRow>> {
    let mut rows = Vec::new();

    for map in store.list_pool_host_maps()? {
        if map.removed.is_some() {
            continue;
        }
        let Some(host) = store.get_host(map.host_id)? else {
            continue;
        };
        if host.removed.is_some() {
            continue;
        }
        let Some(pool) = store.get_storage_pool(map.storage_pool_id)? else {
            continue;
        };
        if pool.removed.is_some() {
            continue;
        }
        // Left join: a host without an agent still qualifies.
        let agent = match host.agent_id {
            Some(agent_id) => store.get_agent(agent_id)?,
            None => None,
        };

        if filter.matches(&host, agent.as_ref(), &pool) {
            rows.push(HostPoolRow {
                host_uuid: host.uuid.clone(),
                host_id: host.id,
                pool_id: pool.id,
            });
        }
    }

    debug!(rows = rows.len(), "host/pool query complete");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::QueryOptions;
    use corral_state::*;

    fn seed_host(store: &StateStore, id: HostId, pool_id: PoolId) {
        store
            .put_host(&HostRecord {
                id,
                uuid: format!("uuid-{id}"),
                account_id: 1,
                agent_id: None,
                kind: "docker".to_string(),
                state: ResourceState::Active,
                removed: None,
            })
            .unwrap();
        store
            .put_storage_pool(&StoragePoolRecord {
                id: pool_id,
                kind: "docker".to_string(),
                state: ResourceState::Active,
                removed: None,
            })
            .unwrap();
        store
            .put_pool_host_map(&StoragePoolHostMap {
                storage_pool_id: pool_id,
                host_id: id,
                removed: None,
            })
            .unwrap();
    }

    #[test]
    fn yields_one_row_per_host_pool_pair() {
        let store = StateStore::open_in_memory().unwrap();
        seed_host(&store, 1, 10);
        seed_host(&store, 2, 11);
        // Second pool on host 1.
        store
            .put_storage_pool(&StoragePoolRecord {
                id: 12,
                kind: "docker".to_string(),
                state: ResourceState::Active,
                removed: None,
            })
            .unwrap();
        store
            .put_pool_host_map(&StoragePoolHostMap {
                storage_pool_id: 12,
                host_id: 1,
                removed: None,
            })
            .unwrap();

        let filter = HostFilter::compile(&QueryOptions::default(), None);
        let rows = fetch_host_pool_rows(&store, &filter).unwrap();

        assert_eq!(rows.len(), 3);
        let host1_pools: Vec<PoolId> = rows
            .iter()
            .filter(|r| r.host_id == 1)
            .map(|r| r.pool_id)
            .collect();
        assert_eq!(host1_pools.len(), 2);
    }

    #[test]
    fn removed_mapping_is_skipped() {
        let store = StateStore::open_in_memory().unwrap();
        seed_host(&store, 1, 10);
        store
            .put_pool_host_map(&StoragePoolHostMap {
                storage_pool_id: 10,
                host_id: 1,
                removed: Some(1000),
            })
            .unwrap();

        let filter = HostFilter::compile(&QueryOptions::default(), None);
        let rows = fetch_host_pool_rows(&store, &filter).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn removed_host_is_skipped() {
        let store = StateStore::open_in_memory().unwrap();
        seed_host(&store, 1, 10);
        store
            .put_host(&HostRecord {
                id: 1,
                uuid: "uuid-1".to_string(),
                account_id: 1,
                agent_id: None,
                kind: "docker".to_string(),
                state: ResourceState::Active,
                removed: Some(1000),
            })
            .unwrap();

        let filter = HostFilter::compile(&QueryOptions::default(), None);
        assert!(fetch_host_pool_rows(&store, &filter).unwrap().is_empty());
    }

    #[test]
    fn inactive_agent_disqualifies_host() {
        let store = StateStore::open_in_memory().unwrap();
        seed_host(&store, 1, 10);
        store
            .put_agent(&AgentRecord {
                id: 77,
                state: ResourceState::Inactive,
                removed: None,
            })
            .unwrap();
        store
            .put_host(&HostRecord {
                id: 1,
                uuid: "uuid-1".to_string(),
                account_id: 1,
                agent_id: Some(77),
                kind: "docker".to_string(),
                state: ResourceState::Active,
                removed: None,
            })
            .unwrap();

        let filter = HostFilter::compile(&QueryOptions::default(), None);
        assert!(fetch_host_pool_rows(&store, &filter).unwrap().is_empty());
    }

    #[test]
    fn empty_store_yields_empty_rows() {
        let store = StateStore::open_in_memory().unwrap();
        let filter = HostFilter::compile(&QueryOptions::default(), None);
        assert!(fetch_host_pool_rows(&store, &filter).unwrap().is_empty());
    }
}
