//! corral-allocator — candidate-host enumeration and resource-request
//! normalization.
//!
//! Given a placement attempt's filter options, this crate produces the
//! stream of hosts eligible to receive the instance, each annotated with
//! its usable storage pools and (optionally) the ports already claimed
//! on it. Independently, it converts an instance's declared demands into
//! typed resource requests for the downstream scoring step. It does NOT
//! pick the winning host — that is the caller's allocation loop.
//!
//! # Architecture
//!
//! ```text
//! enumerate_candidates
//!   ├── HostFilter (compile QueryOptions into a host/pool predicate)
//!   ├── fetch_host_pool_rows (host ⋈ pool-map ⋈ pool, left ⋈ agent)
//!   ├── assemble (open mode: shuffle + group; ordered mode: caller order)
//!   └── attach_used_ports (optional per-host port usage)
//!
//! build_resource_request
//!   └── ResourceKind → ComputeRequest | PortBindingRequest | none
//! ```

pub mod candidates;
pub mod error;
pub mod filter;
pub mod ports;
pub mod query;
pub mod requests;

pub use candidates::{CandidateHost, CandidateStream, enumerate_candidates, enumerate_candidates_with_rng};
pub use error::{AllocatorError, AllocatorResult};
pub use filter::{HostFilter, QueryOptions};
pub use query::HostPoolRow;
pub use requests::{
    ComputeRequest, PortBindingRequest, PortSpec, ResourceKind, ResourceRequest,
    build_resource_request,
};
