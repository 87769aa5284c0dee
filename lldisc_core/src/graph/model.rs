use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::time::Instant;

use ipnetwork::IpNetwork;
use lldisc_types::{Advertisement, InterfaceDetails, MachineId};

/// One discovered host (spec §3).
#[derive(Debug, Clone)]
pub struct Node {
    pub machine_id: MachineId,
    pub hostname: String,
    pub last_seen: Instant,
    pub interfaces: HashMap<String, InterfaceDetails>,
    pub is_local: bool,
}

/// Key an edge is stored and looked up under: the unordered pair of
/// (interface, address) on each side collapses to (local_interface,
/// remote_interface) once the remote node's identity pins down which
/// remote NIC is meant (spec §3 invariant, §4.4 "same (local_iface,
/// remote_iface) pair").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub remote_machine_id: MachineId,
    pub local_interface: String,
    pub remote_interface: String,
}

/// Observed reachability between a local interface of the local node and a
/// remote interface of `remote_machine_id` (spec §3).
#[derive(Debug, Clone)]
pub struct Edge {
    pub remote_machine_id: MachineId,

    pub local_interface: String,
    pub local_address: Ipv6Addr,
    pub local_rdma_device: Option<String>,
    pub local_node_guid: Option<String>,
    pub local_sys_image_guid: Option<String>,
    pub local_speed: Option<u32>,
    pub local_prefixes: Vec<IpNetwork>,

    pub remote_interface: String,
    pub remote_address: Ipv6Addr,
    pub remote_rdma_device: Option<String>,
    pub remote_node_guid: Option<String>,
    pub remote_sys_image_guid: Option<String>,
    pub remote_speed: Option<u32>,
    pub remote_prefixes: Vec<IpNetwork>,

    pub direct: bool,
    /// Machine id of the intermediary, when `direct` is false. Empty
    /// (`None`) when the edge was learned directly.
    pub learned_from: Option<MachineId>,
}

pub fn interface_details_from_ad(ad: &Advertisement) -> InterfaceDetails {
    InterfaceDetails {
        link_local: ad.source_ip,
        global_prefixes: ad.global_prefixes.clone(),
        rdma_device: ad.rdma_device.clone(),
        node_guid: ad.node_guid.clone(),
        sys_image_guid: ad.sys_image_guid.clone(),
        speed: ad.speed,
    }
}

/// A deep-copied, lock-free view of the graph, safe to hand to renderers
/// and HTTP handlers (spec §3 ownership: "no external references to
/// interior structures survive a method call").
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
