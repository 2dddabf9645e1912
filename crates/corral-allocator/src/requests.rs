//! Resource request factory — converts an instance's declared demand
//! for one resource kind into a typed request for the downstream
//! scoring step, or signals "no demand".
//!
//! The kind set is closed: instance slot, memory, CPU, and port
//! bindings. Unrecognized kind labels are not errors — they simply
//! contribute no demand, exactly like a missing reservation. A request
//! is never built with zero or empty demand.

use serde::{Deserialize, Serialize};

use corral_state::{InstanceRecord, StateStore};

use crate::error::AllocatorResult;

/// The categories of demand an instance can place on a host.
///
/// Serialized labels are the platform's wire names, which the
/// downstream scorer keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    InstanceReservation,
    MemoryReservation,
    CpuReservation,
    PortReservation,
}

impl ResourceKind {
    /// Parse a wire label; unknown labels are `None`, not an error.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "instanceReservation" => Some(Self::InstanceReservation),
            "memoryReservation" => Some(Self::MemoryReservation),
            "cpuReservation" => Some(Self::CpuReservation),
            "portReservation" => Some(Self::PortReservation),
            _ => None,
        }
    }

    /// The wire label for this kind.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::InstanceReservation => "instanceReservation",
            Self::MemoryReservation => "memoryReservation",
            Self::CpuReservation => "cpuReservation",
            Self::PortReservation => "portReservation",
        }
    }
}

/// A quantified demand against host capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    /// Which capacity this request draws from; never `PortReservation`.
    pub resource: ResourceKind,
    /// Always positive — zero demand yields no request instead.
    pub amount: u64,
    pub pool_type: String,
}

/// One requested port mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    /// Bind address; `None` means all interfaces.
    pub ip_address: Option<String>,
    pub private_port: u16,
    pub public_port: u16,
}

/// A demand for a set of public port bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBindingRequest {
    pub instance_id: String,
    pub pool_type: String,
    /// Non-empty by construction.
    pub port_specs: Vec<PortSpec>,
}

/// A normalized resource demand for one allocation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRequest {
    Compute(ComputeRequest),
    PortBinding(PortBindingRequest),
}

/// Build the resource request an instance places for one resource kind.
///
/// Returns `Ok(None)` when the instance has no demand of that kind
/// (no declared ports, reservation absent or zero) and for unrecognized
/// kind labels. Store failures propagate.
pub fn build_resource_request(
    store: &StateStore,
    instance: &InstanceRecord,
    resource_kind: &str,
    pool_type: &str,
) -> AllocatorResult<Option<ResourceRequest>> {
    let Some(kind) = ResourceKind::parse(resource_kind) else {
        return Ok(None);
    };

    let request = match kind {
        ResourceKind::PortReservation => {
            let port_specs: Vec<PortSpec> = store
                .ports_for_instance(instance.id)?
                .into_iter()
                .filter(|p| p.removed.is_none())
                .map(|p| PortSpec {
                    ip_address: p.bind_address,
                    private_port: p.private_port,
                    public_port: p.public_port,
                })
                .collect();
            if port_specs.is_empty() {
                return Ok(None);
            }
            Some(ResourceRequest::PortBinding(PortBindingRequest {
                instance_id: instance.id.to_string(),
                pool_type: pool_type.to_string(),
                port_specs,
            }))
        }
        ResourceKind::InstanceReservation => Some(compute(kind, 1, pool_type)),
        ResourceKind::MemoryReservation => instance
            .memory_reservation
            .filter(|&amount| amount > 0)
            .map(|amount| compute(kind, amount, pool_type)),
        ResourceKind::CpuReservation => instance
            .milli_cpu_reservation
            .filter(|&amount| amount > 0)
            .map(|amount| compute(kind, amount, pool_type)),
    };
    Ok(request)
}

fn compute(resource: ResourceKind, amount: u64, pool_type: &str) -> ResourceRequest {
    ResourceRequest::Compute(ComputeRequest {
        resource,
        amount,
        pool_type: pool_type.to_string(),
    })
}
