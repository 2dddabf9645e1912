//! Condition building — compiles a placement attempt's filter options
//! into a single predicate over (host, agent, pool) rows.
//!
//! Clause precedence follows the platform's allocation policy:
//!
//! 1. Account scoping always applies when present.
//! 2. A requested host id short-circuits everything else: the caller
//!    asked for one specific host, so state, uuid-list, host-set, and
//!    kind clauses are intentionally bypassed.
//! 3. Otherwise: the host's agent (if any) must be active, the host must
//!    be active or updating-active, the pool must be active, and the
//!    host uuid must appear in the caller's uuid list when one was given.
//! 4. A non-empty concrete host-id set further restricts by host id.
//! 5. A kind filter requires host kind AND pool kind to match.

use std::collections::HashSet;

use corral_state::{AccountId, AgentRecord, HostId, HostRecord, ResourceState, StoragePoolRecord};

/// Filter options for one candidate enumeration.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Restrict candidates to hosts owned by this account.
    pub account_id: Option<AccountId>,
    /// The caller demands this exact host; overrides all other criteria
    /// except account scoping.
    pub requested_host_id: Option<HostId>,
    /// Concrete host ids to restrict to; empty means no restriction.
    pub hosts: HashSet<HostId>,
    /// Host/pool kind both candidates must match, e.g. "docker".
    pub kind: Option<String>,
    /// Whether to annotate candidates with currently claimed ports.
    pub include_used_ports: bool,
}

/// Compiled predicate over the host/pool relation.
#[derive(Debug, Clone)]
pub struct HostFilter {
    account_id: Option<AccountId>,
    requested_host_id: Option<HostId>,
    allowed_uuids: Option<HashSet<String>>,
    host_ids: Option<HashSet<HostId>>,
    kind: Option<String>,
}

impl HostFilter {
    /// Compile filter options (plus an optional explicit host-uuid list)
    /// into a predicate.
    ///
    /// When `requested_host_id` is set, the compiled filter checks only
    /// account and host id — the requested host wins even if it is
    /// inactive or of a different kind. An absent or empty uuid list
    /// imposes no restriction.
    pub fn compile(options: &QueryOptions, ordered_host_uuids: Option<&[String]>) -> Self {
        if options.requested_host_id.is_some() {
            return Self {
                account_id: options.account_id,
                requested_host_id: options.requested_host_id,
                allowed_uuids: None,
                host_ids: None,
                kind: None,
            };
        }

        let allowed_uuids = ordered_host_uuids
            .filter(|uuids| !uuids.is_empty())
            .map(|uuids| uuids.iter().cloned().collect());

        Self {
            account_id: options.account_id,
            requested_host_id: None,
            allowed_uuids,
            host_ids: (!options.hosts.is_empty()).then(|| options.hosts.clone()),
            kind: options.kind.clone(),
        }
    }

    /// Evaluate the predicate against one joined (host, agent, pool) row.
    pub fn matches(
        &self,
        host: &HostRecord,
        agent: Option<&AgentRecord>,
        pool: &StoragePoolRecord,
    ) -> bool {
        if let Some(account_id) = self.account_id
            && host.account_id != account_id
        {
            return false;
        }

        // Requested host short-circuits the remaining clauses.
        if let Some(requested) = self.requested_host_id {
            return host.id == requested;
        }

        let agent_active = agent.is_none_or(|a| a.state == ResourceState::Active);
        if !agent_active {
            return false;
        }
        if !matches!(
            host.state,
            ResourceState::Active | ResourceState::UpdatingActive
        ) {
            return false;
        }
        if pool.state != ResourceState::Active {
            return false;
        }
        if let Some(uuids) = &self.allowed_uuids
            && !uuids.contains(&host.uuid)
        {
            return false;
        }

        if let Some(ids) = &self.host_ids
            && !ids.contains(&host.id)
        {
            return false;
        }

        if let Some(kind) = &self.kind
            && (host.kind != *kind || pool.kind != *kind)
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(id: HostId, account_id: AccountId) -> HostRecord {
        HostRecord {
            id,
            uuid: format!("uuid-{id}"),
            account_id,
            agent_id: None,
            kind: "docker".to_string(),
            state: ResourceState::Active,
            removed: None,
        }
    }

    fn pool(id: u64, kind: &str) -> StoragePoolRecord {
        StoragePoolRecord {
            id,
            kind: kind.to_string(),
            state: ResourceState::Active,
            removed: None,
        }
    }

    fn agent(state: ResourceState) -> AgentRecord {
        AgentRecord {
            id: 1,
            state,
            removed: None,
        }
    }

    #[test]
    fn empty_options_match_active_rows() {
        let filter = HostFilter::compile(&QueryOptions::default(), None);
        assert!(filter.matches(&host(1, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn account_scoping_applies() {
        let options = QueryOptions {
            account_id: Some(2),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        assert!(filter.matches(&host(1, 2), None, &pool(1, "docker")));
        assert!(!filter.matches(&host(1, 3), None, &pool(1, "docker")));
    }

    #[test]
    fn requested_host_bypasses_state_checks() {
        let options = QueryOptions {
            requested_host_id: Some(5),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        let mut inactive = host(5, 1);
        inactive.state = ResourceState::Inactive;
        let mut dead_pool = pool(1, "docker");
        dead_pool.state = ResourceState::Inactive;

        assert!(filter.matches(&inactive, Some(&agent(ResourceState::Inactive)), &dead_pool));
        assert!(!filter.matches(&host(6, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn requested_host_still_scoped_to_account() {
        let options = QueryOptions {
            account_id: Some(2),
            requested_host_id: Some(5),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        assert!(filter.matches(&host(5, 2), None, &pool(1, "docker")));
        assert!(!filter.matches(&host(5, 3), None, &pool(1, "docker")));
    }

    #[test]
    fn requested_host_bypasses_kind_filter() {
        // Intentional precedence: the requested host wins over kind.
        let options = QueryOptions {
            requested_host_id: Some(5),
            kind: Some("storage".to_string()),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        assert!(filter.matches(&host(5, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn missing_agent_passes_inactive_agent_fails() {
        let filter = HostFilter::compile(&QueryOptions::default(), None);
        let h = host(1, 1);
        let p = pool(1, "docker");

        assert!(filter.matches(&h, None, &p));
        assert!(filter.matches(&h, Some(&agent(ResourceState::Active)), &p));
        assert!(!filter.matches(&h, Some(&agent(ResourceState::Inactive)), &p));
    }

    #[test]
    fn host_state_must_be_active_or_updating() {
        let filter = HostFilter::compile(&QueryOptions::default(), None);
        let p = pool(1, "docker");

        let mut h = host(1, 1);
        assert!(filter.matches(&h, None, &p));

        h.state = ResourceState::UpdatingActive;
        assert!(filter.matches(&h, None, &p));

        h.state = ResourceState::Inactive;
        assert!(!filter.matches(&h, None, &p));
    }

    #[test]
    fn pool_state_must_be_active() {
        let filter = HostFilter::compile(&QueryOptions::default(), None);
        let mut p = pool(1, "docker");
        p.state = ResourceState::UpdatingActive;

        assert!(!filter.matches(&host(1, 1), None, &p));
    }

    #[test]
    fn uuid_list_restricts_when_non_empty() {
        let uuids = vec!["uuid-1".to_string(), "uuid-3".to_string()];
        let filter = HostFilter::compile(&QueryOptions::default(), Some(&uuids));

        assert!(filter.matches(&host(1, 1), None, &pool(1, "docker")));
        assert!(!filter.matches(&host(2, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn empty_uuid_list_imposes_no_restriction() {
        let filter = HostFilter::compile(&QueryOptions::default(), Some(&[]));
        assert!(filter.matches(&host(2, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn concrete_host_set_restricts() {
        let options = QueryOptions {
            hosts: [1, 3].into_iter().collect(),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        assert!(filter.matches(&host(3, 1), None, &pool(1, "docker")));
        assert!(!filter.matches(&host(2, 1), None, &pool(1, "docker")));
    }

    #[test]
    fn kind_filter_requires_host_and_pool_match() {
        let options = QueryOptions {
            kind: Some("storage".to_string()),
            ..Default::default()
        };
        let filter = HostFilter::compile(&options, None);

        let mut storage_host = host(1, 1);
        storage_host.kind = "storage".to_string();

        assert!(filter.matches(&storage_host, None, &pool(1, "storage")));
        // Matching host kind but mismatched pool kind is excluded.
        assert!(!filter.matches(&storage_host, None, &pool(1, "docker")));
        assert!(!filter.matches(&host(2, 1), None, &pool(1, "storage")));
    }
}
