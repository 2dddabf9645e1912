//! Used-port augmentation — annotates candidate hosts with the ports
//! already claimed by live instances on them.
//!
//! A port counts as used when its instance is live and in a state that
//! holds port bindings (starting, restarting, running), its host mapping
//! and port record are live, and no live service exposure of the
//! instance is flagged as upgrading. The upgrade exclusion keeps a
//! rolling upgrade from falsely reserving the old port.
//!
//! Purely additive and idempotent: `used_ports` is assigned, never
//! appended, so re-running against unchanged state yields the same
//! result. Every candidate ends up with a sequence — empty when no
//! qualifying ports exist, never absent.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use corral_state::{HostId, PortRecord, StateStore};

use crate::candidates::CandidateHost;
use crate::error::AllocatorResult;

/// Populate `used_ports` on each candidate from live port claims.
pub fn attach_used_ports(
    store: &StateStore,
    host_ids: &HashSet<HostId>,
    candidates: &mut [CandidateHost],
) -> AllocatorResult<()> {
    let mut by_host: HashMap<HostId, Vec<PortRecord>> = HashMap::new();

    for map in store.list_instance_host_maps()? {
        if map.removed.is_some() || !host_ids.contains(&map.host_id) {
            continue;
        }
        let Some(instance) = store.get_instance(map.instance_id)? else {
            continue;
        };
        if instance.removed.is_some() || !instance.state.holds_ports() {
            continue;
        }
        if instance_is_upgrading(store, map.instance_id)? {
            continue;
        }
        for port in store.ports_for_instance(map.instance_id)? {
            if port.removed.is_none() {
                by_host.entry(map.host_id).or_default().push(port);
            }
        }
    }

    debug!(hosts = by_host.len(), "used-port lookup complete");

    for candidate in candidates {
        candidate.used_ports = by_host.remove(&candidate.host_id).unwrap_or_default();
    }
    Ok(())
}

/// True when any live exposure of the instance is part of an in-flight
/// rolling upgrade.
fn instance_is_upgrading(store: &StateStore, instance_id: u64) -> AllocatorResult<bool> {
    let upgrading = store
        .exposures_for_instance(instance_id)?
        .iter()
        .any(|e| e.removed.is_none() && e.upgrade);
    Ok(upgrading)
}
