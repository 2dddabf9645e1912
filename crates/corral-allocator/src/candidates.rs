//! Candidate assembly — turns raw (host, pool) rows into one candidate
//! per host and fixes the emission order.
//!
//! Two mutually exclusive modes:
//!
//! - **Open mode** (no explicit host order): the row sequence is put
//!   through a uniform random permutation *before* grouping. This is the
//!   fairness mechanism — without it, hosts that happen to sort first in
//!   the store would be offered to every allocation attempt first. The
//!   permuted encounter order of hosts becomes the emission order.
//! - **Ordered mode** (caller supplied a host-uuid list): candidates are
//!   emitted exactly in the caller's order, one per uuid, silently
//!   skipping uuids with no matching rows.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use corral_state::{HostId, PoolId, PortRecord, StateStore, VolumeId};

use crate::error::AllocatorResult;
use crate::filter::{HostFilter, QueryOptions};
use crate::ports::attach_used_ports;
use crate::query::{HostPoolRow, fetch_host_pool_rows};

/// A host eligible to receive an instance, with the storage pools that
/// qualified it and (when requested) the ports already claimed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHost {
    pub host_id: HostId,
    pub host_uuid: String,
    /// All storage pools on this host that satisfied the filter.
    pub pool_ids: HashSet<PoolId>,
    /// Ports claimed by live instances on this host; empty unless
    /// used-port augmentation was requested.
    pub used_ports: Vec<PortRecord>,
}

/// Single-pass stream of candidate hosts for one allocation attempt.
///
/// Carries the caller's volume ids through untouched for the downstream
/// consumer that builds full allocation candidates.
#[derive(Debug)]
pub struct CandidateStream {
    hosts: std::vec::IntoIter<CandidateHost>,
    volume_ids: Vec<VolumeId>,
}

impl CandidateStream {
    /// Volume ids the caller passed in, unmodified.
    pub fn volume_ids(&self) -> &[VolumeId] {
        &self.volume_ids
    }
}

impl Iterator for CandidateStream {
    type Item = CandidateHost;

    fn next(&mut self) -> Option<Self::Item> {
        self.hosts.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hosts.size_hint()
    }
}

impl ExactSizeIterator for CandidateStream {}

/// Enumerate candidate hosts using the process-wide random source for
/// the open-mode shuffle.
pub fn enumerate_candidates(
    store: &StateStore,
    ordered_host_uuids: Option<&[String]>,
    volume_ids: Vec<VolumeId>,
    options: &QueryOptions,
) -> AllocatorResult<CandidateStream> {
    enumerate_candidates_with_rng(
        store,
        ordered_host_uuids,
        volume_ids,
        options,
        &mut rand::thread_rng(),
    )
}

/// Enumerate candidate hosts with a caller-supplied random source.
///
/// Tests pass a seeded generator to make the open-mode permutation
/// deterministic. The generator is unused in ordered mode.
pub fn enumerate_candidates_with_rng<R: Rng>(
    store: &StateStore,
    ordered_host_uuids: Option<&[String]>,
    volume_ids: Vec<VolumeId>,
    options: &QueryOptions,
    rng: &mut R,
) -> AllocatorResult<CandidateStream> {
    let filter = HostFilter::compile(options, ordered_host_uuids);
    let rows = fetch_host_pool_rows(store, &filter)?;

    let mut candidates = match ordered_host_uuids {
        None => assemble_open(rows, rng),
        Some(uuids) => assemble_ordered(rows, uuids),
    };
    if options.include_used_ports {
        let host_ids: HashSet<HostId> = candidates.iter().map(|c| c.host_id).collect();
        attach_used_ports(store, &host_ids, &mut candidates)?;
    }

    debug!(
        candidates = candidates.len(),
        ordered = ordered_host_uuids.is_some(),
        "candidate enumeration complete"
    );
    Ok(CandidateStream {
        hosts: candidates.into_iter(),
        volume_ids,
    })
}

/// Open mode: shuffle rows, then group by host id in encounter order.
fn assemble_open<R: Rng>(mut rows: Vec<HostPoolRow>, rng: &mut R) -> Vec<CandidateHost> {
    rows.shuffle(rng);

    let mut grouped: IndexMap<HostId, CandidateHost> = IndexMap::new();
    for row in rows {
        grouped
            .entry(row.host_id)
            .or_insert_with(|| CandidateHost {
                host_id: row.host_id,
                host_uuid: row.host_uuid,
                pool_ids: HashSet::new(),
                used_ports: Vec::new(),
            })
            .pool_ids
            .insert(row.pool_id);
    }
    grouped.into_values().collect()
}

/// Ordered mode: one candidate per caller-supplied uuid, in that order,
/// skipping uuids with no matching rows.
fn assemble_ordered(rows: Vec<HostPoolRow>, ordered_uuids: &[String]) -> Vec<CandidateHost> {
    let mut by_uuid: HashMap<&str, (HostId, HashSet<PoolId>)> = HashMap::new();
    for row in &rows {
        by_uuid
            .entry(row.host_uuid.as_str())
            .or_insert_with(|| (row.host_id, HashSet::new()))
            .1
            .insert(row.pool_id);
    }

    let mut candidates = Vec::new();
    for uuid in ordered_uuids {
        if let Some((host_id, pool_ids)) = by_uuid.remove(uuid.as_str()) {
            candidates.push(CandidateHost {
                host_id,
                host_uuid: uuid.clone(),
                pool_ids,
                used_ports: Vec::new(),
            });
        }
    }
    candidates
}
