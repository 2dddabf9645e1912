//! corral-state — embedded platform-state store backed by redb.
//!
//! Holds the relations the allocator reads when enumerating candidate
//! hosts: hosts, agents, storage pools, pool-host mappings, instances,
//! instance-host mappings, ports, and service exposures. Records are
//! JSON-serialized into redb `&[u8]` value columns. The store supports
//! both on-disk and in-memory backends (the latter for testing).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
