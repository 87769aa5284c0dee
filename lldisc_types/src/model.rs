use std::net::Ipv6Addr;

use ipnetwork::IpNetwork;
use serde_derive::{Deserialize, Serialize};

/// A host-stable opaque identifier. On Linux this is the trimmed contents
/// of `/etc/machine-id`; other platforms substitute an equivalently stable
/// per-host fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineId(pub String);

impl MachineId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MachineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MachineId {
    fn from(s: String) -> Self {
        MachineId(s)
    }
}

/// One NIC as seen by the interface inventory collaborator. Supplied fresh
/// on every send cycle -- never cached by the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalInterface {
    pub name: String,
    /// Link-local IPv6 address. The zone (scope id) is always `name`.
    pub link_local: Ipv6Addr,
    pub global_prefixes: Vec<IpNetwork>,
    pub rdma_device: Option<String>,
    pub node_guid: Option<String>,
    pub sys_image_guid: Option<String>,
    /// Link speed in Mbit/s, when known.
    pub speed: Option<u32>,
}

/// One NIC as recorded on a `Node` in the graph. Identical field set to
/// `LocalInterface` but keyed separately since it is persisted graph state
/// rather than a fresh inventory read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDetails {
    pub link_local: Ipv6Addr,
    pub global_prefixes: Vec<IpNetwork>,
    pub rdma_device: Option<String>,
    pub node_guid: Option<String>,
    pub sys_image_guid: Option<String>,
    pub speed: Option<u32>,
}

impl From<LocalInterface> for InterfaceDetails {
    fn from(iface: LocalInterface) -> Self {
        InterfaceDetails {
            link_local: iface.link_local,
            global_prefixes: iface.global_prefixes,
            rdma_device: iface.rdma_device,
            node_guid: iface.node_guid,
            sys_image_guid: iface.sys_image_guid,
            speed: iface.speed,
        }
    }
}

impl From<&LocalInterface> for InterfaceDetails {
    fn from(iface: &LocalInterface) -> Self {
        InterfaceDetails::from(iface.clone())
    }
}

/// One side (local or remote) of a `NeighborRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborSide {
    pub interface: String,
    pub address: Ipv6Addr,
    pub rdma_device: Option<String>,
    pub node_guid: Option<String>,
    pub sys_image_guid: Option<String>,
    pub speed: Option<u32>,
    pub prefixes: Vec<IpNetwork>,
}

/// A directed edge the sender has observed, embedded in an `Advertisement`
/// when neighbor sharing is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub machine_id: MachineId,
    pub hostname: String,
    pub local: NeighborSide,
    pub remote: NeighborSide,
}

/// One datagram payload: a host's self-announcement on one interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub machine_id: MachineId,
    pub hostname: String,
    /// Seconds since epoch, sender's monotonic-enough wall clock.
    pub timestamp: u64,
    pub interface: String,
    pub source_ip: Ipv6Addr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdma_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_image_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_prefixes: Vec<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<Vec<NeighborRecord>>,
}
