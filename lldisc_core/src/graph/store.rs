use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lldisc_types::{
    Advertisement, InterfaceDetails, LocalInterface, MachineId, NeighborRecord, NeighborSide,
};

use super::model::{interface_details_from_ad, Edge, EdgeKey, GraphSnapshot, Node};
use super::segments::{compute_segments, NetworkSegment};

struct Inner {
    local_machine_id: Option<MachineId>,
    nodes: HashMap<MachineId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    changed: bool,
}

impl Inner {
    fn new() -> Inner {
        Inner {
            local_machine_id: None,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            changed: false,
        }
    }
}

/// The central concurrent data structure: the local node, remote nodes,
/// and all edges (spec §3, §4.4). Every mutating operation acquires a
/// single exclusive lock and releases it before returning; reads acquire
/// a shared lock (spec §5). Coarse-grained on purpose -- the expected
/// scale (< 10^4 nodes) does not reward fine-grained locking (spec §9).
pub struct GraphStore {
    inner: RwLock<Inner>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> GraphStore {
        GraphStore {
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Registers the local node. Idempotent; subsequent calls replace the
    /// interface map wholesale. The local node never expires.
    pub fn set_local(&self, machine_id: MachineId, hostname: String, interfaces: &[LocalInterface]) {
        let mut inner = self.inner.write().unwrap();
        let mut map = HashMap::new();
        for iface in interfaces {
            map.insert(iface.name.clone(), InterfaceDetails::from(iface));
        }
        let is_new = inner.local_machine_id.as_ref() != Some(&machine_id)
            || !inner.nodes.contains_key(&machine_id);
        inner.local_machine_id = Some(machine_id.clone());
        inner.nodes.insert(
            machine_id.clone(),
            Node {
                machine_id,
                hostname,
                last_seen: Instant::now(),
                interfaces: map,
                is_local: true,
            },
        );
        if is_new {
            inner.changed = true;
        }
    }

    pub fn local_machine_id(&self) -> Option<MachineId> {
        self.inner.read().unwrap().local_machine_id.clone()
    }

    /// Idempotent upsert of the remote node identified by `ad.machine_id`
    /// and the direct edge it implies (spec §4.4).
    pub fn record_direct(&self, ad: &Advertisement, source_ip: Ipv6Addr, arrival_iface: &str) {
        let mut inner = self.inner.write().unwrap();
        if Some(&ad.machine_id) == inner.local_machine_id.as_ref() {
            log::trace!("dropping self-advertisement from {}", ad.machine_id);
            return;
        }

        let now = Instant::now();
        let is_new_node = !inner.nodes.contains_key(&ad.machine_id);
        let node = inner
            .nodes
            .entry(ad.machine_id.clone())
            .or_insert_with(|| Node {
                machine_id: ad.machine_id.clone(),
                hostname: ad.hostname.clone(),
                last_seen: now,
                interfaces: HashMap::new(),
                is_local: false,
            });
        node.hostname = ad.hostname.clone();
        if now > node.last_seen {
            node.last_seen = now;
        }
        let is_new_iface = !node.interfaces.contains_key(&ad.interface);
        node.interfaces
            .insert(ad.interface.clone(), interface_details_from_ad(ad));

        let local_iface = inner
            .local_machine_id
            .clone()
            .and_then(|id| inner.nodes.get(&id))
            .and_then(|local| local.interfaces.get(arrival_iface).cloned());

        let key = EdgeKey {
            remote_machine_id: ad.machine_id.clone(),
            local_interface: arrival_iface.to_string(),
            remote_interface: ad.interface.clone(),
        };
        let is_new_edge = !inner.edges.contains_key(&key);
        let entry = inner.edges.entry(key).or_insert_with(|| Edge {
            remote_machine_id: ad.machine_id.clone(),
            local_interface: arrival_iface.to_string(),
            local_address: local_iface.as_ref().map(|d| d.link_local).unwrap_or(Ipv6Addr::UNSPECIFIED),
            local_rdma_device: None,
            local_node_guid: None,
            local_sys_image_guid: None,
            local_speed: None,
            local_prefixes: Vec::new(),
            remote_interface: ad.interface.clone(),
            remote_address: source_ip,
            remote_rdma_device: ad.rdma_device.clone(),
            remote_node_guid: ad.node_guid.clone(),
            remote_sys_image_guid: ad.sys_image_guid.clone(),
            remote_speed: ad.speed,
            remote_prefixes: ad.global_prefixes.clone(),
            direct: true,
            learned_from: None,
        });
        if let Some(details) = &local_iface {
            entry.local_address = details.link_local;
            entry.local_rdma_device = details.rdma_device.clone();
            entry.local_node_guid = details.node_guid.clone();
            entry.local_sys_image_guid = details.sys_image_guid.clone();
            entry.local_speed = details.speed;
            entry.local_prefixes = details.global_prefixes.clone();
        }
        entry.remote_address = source_ip;
        entry.remote_rdma_device = ad.rdma_device.clone();
        entry.remote_node_guid = ad.node_guid.clone();
        entry.remote_sys_image_guid = ad.sys_image_guid.clone();
        entry.remote_speed = ad.speed;
        entry.remote_prefixes = ad.global_prefixes.clone();
        // direct=true once set MUST NOT be downgraded; a direct observation
        // always wins and clears any stale intermediary attribution.
        entry.direct = true;
        entry.learned_from = None;

        if is_new_node || is_new_iface || is_new_edge {
            inner.changed = true;
        }
    }

    /// Idempotent upsert of an indirectly-learned edge (spec §4.4). Per the
    /// source's own convention (spec §9 Open Questions), the edge's "local"
    /// side fields are populated from `neighbor.local` -- i.e. the
    /// intermediary's own interface toward the peer, not the true local
    /// node's interface. This looks backwards but is the behavior the
    /// original source has and this spec preserves.
    pub fn record_indirect(&self, neighbor: &NeighborRecord, learned_from: MachineId) {
        let mut inner = self.inner.write().unwrap();
        if Some(&neighbor.machine_id) == inner.local_machine_id.as_ref() {
            log::trace!(
                "dropping neighbor record naming the local node: {}",
                neighbor.machine_id
            );
            return;
        }

        // Direct supersedes indirect: bail out before touching `inner.nodes`
        // at all when a direct edge for this exact key already exists, so a
        // lower-trust indirect observation can never clobber the node's
        // interface map with stale/forged data even though the edge itself
        // is correctly left alone (spec §4.4/§9).
        let key = EdgeKey {
            remote_machine_id: neighbor.machine_id.clone(),
            local_interface: neighbor.local.interface.clone(),
            remote_interface: neighbor.remote.interface.clone(),
        };
        if inner.edges.get(&key).is_some_and(|existing| existing.direct) {
            return;
        }

        let now = Instant::now();
        let is_new_node = !inner.nodes.contains_key(&neighbor.machine_id);
        let node = inner
            .nodes
            .entry(neighbor.machine_id.clone())
            .or_insert_with(|| Node {
                machine_id: neighbor.machine_id.clone(),
                hostname: neighbor.hostname.clone(),
                last_seen: now,
                interfaces: HashMap::new(),
                is_local: false,
            });
        node.hostname = neighbor.hostname.clone();
        if now > node.last_seen {
            node.last_seen = now;
        }
        let is_new_iface = !node.interfaces.contains_key(&neighbor.remote.interface);
        node.interfaces.insert(
            neighbor.remote.interface.clone(),
            InterfaceDetails {
                link_local: neighbor.remote.address,
                global_prefixes: neighbor.remote.prefixes.clone(),
                rdma_device: neighbor.remote.rdma_device.clone(),
                node_guid: neighbor.remote.node_guid.clone(),
                sys_image_guid: neighbor.remote.sys_image_guid.clone(),
                speed: neighbor.remote.speed,
            },
        );

        let is_new_edge = !inner.edges.contains_key(&key);
        let entry = inner.edges.entry(key).or_insert_with(|| Edge {
            remote_machine_id: neighbor.machine_id.clone(),
            local_interface: neighbor.local.interface.clone(),
            local_address: neighbor.local.address,
            local_rdma_device: neighbor.local.rdma_device.clone(),
            local_node_guid: neighbor.local.node_guid.clone(),
            local_sys_image_guid: neighbor.local.sys_image_guid.clone(),
            local_speed: neighbor.local.speed,
            local_prefixes: neighbor.local.prefixes.clone(),
            remote_interface: neighbor.remote.interface.clone(),
            remote_address: neighbor.remote.address,
            remote_rdma_device: neighbor.remote.rdma_device.clone(),
            remote_node_guid: neighbor.remote.node_guid.clone(),
            remote_sys_image_guid: neighbor.remote.sys_image_guid.clone(),
            remote_speed: neighbor.remote.speed,
            remote_prefixes: neighbor.remote.prefixes.clone(),
            direct: false,
            learned_from: Some(learned_from.clone()),
        });
        entry.local_address = neighbor.local.address;
        entry.local_rdma_device = neighbor.local.rdma_device.clone();
        entry.local_node_guid = neighbor.local.node_guid.clone();
        entry.local_sys_image_guid = neighbor.local.sys_image_guid.clone();
        entry.local_speed = neighbor.local.speed;
        entry.local_prefixes = neighbor.local.prefixes.clone();
        entry.remote_address = neighbor.remote.address;
        entry.remote_rdma_device = neighbor.remote.rdma_device.clone();
        entry.remote_node_guid = neighbor.remote.node_guid.clone();
        entry.remote_sys_image_guid = neighbor.remote.sys_image_guid.clone();
        entry.remote_speed = neighbor.remote.speed;
        entry.remote_prefixes = neighbor.remote.prefixes.clone();
        if entry.learned_from.is_none() {
            entry.learned_from = Some(learned_from);
        }

        if is_new_node || is_new_iface || is_new_edge {
            inner.changed = true;
        }
    }

    pub fn has_changes(&self) -> bool {
        self.inner.read().unwrap().changed
    }

    pub fn clear_changes(&self) {
        self.inner.write().unwrap().changed = false;
    }

    /// Removes remote nodes whose last advertisement is strictly older
    /// than `node_timeout`, and all edges incident to them. The local
    /// node is exempt. Returns the number of nodes removed.
    pub fn remove_expired(&self, node_timeout: Duration) -> usize {
        let mut inner = self.inner.write().unwrap();
        let now = Instant::now();
        let expired: Vec<MachineId> = inner
            .nodes
            .values()
            .filter(|n| !n.is_local && now.duration_since(n.last_seen) > node_timeout)
            .map(|n| n.machine_id.clone())
            .collect();

        for id in &expired {
            inner.nodes.remove(id);
        }
        if !expired.is_empty() {
            inner
                .edges
                .retain(|key, _| !expired.contains(&key.remote_machine_id));
            inner.changed = true;
        }
        expired.len()
    }

    /// Returns a deep copy of the current nodes and edges.
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.read().unwrap();
        GraphSnapshot {
            nodes: inner.nodes.values().cloned().collect(),
            edges: inner.edges.values().cloned().collect(),
        }
    }

    /// The local node's current direct edges, used by the sender to build
    /// neighbor-sharing advertisements. Excludes indirect edges per spec
    /// §4.2 ("Neighbors learned indirectly MUST NOT be re-advertised").
    pub fn local_direct_edges(&self) -> Vec<Edge> {
        let inner = self.inner.read().unwrap();
        inner.edges.values().filter(|e| e.direct).cloned().collect()
    }

    /// Builds the `NeighborRecord` list the sender embeds in its own
    /// advertisement when neighbor sharing is enabled: one entry per direct
    /// edge, carrying both sides' identity so a remote peer can turn it back
    /// into an indirect edge (spec §4.2). Indirect edges are excluded by
    /// construction since `local_direct_edges` already filters on `direct`.
    pub fn neighbor_records(&self) -> Vec<NeighborRecord> {
        let inner = self.inner.read().unwrap();
        inner
            .edges
            .values()
            .filter(|e| e.direct)
            .filter_map(|e| {
                let hostname = inner.nodes.get(&e.remote_machine_id)?.hostname.clone();
                Some(NeighborRecord {
                    machine_id: e.remote_machine_id.clone(),
                    hostname,
                    local: NeighborSide {
                        interface: e.local_interface.clone(),
                        address: e.local_address,
                        rdma_device: e.local_rdma_device.clone(),
                        node_guid: e.local_node_guid.clone(),
                        sys_image_guid: e.local_sys_image_guid.clone(),
                        speed: e.local_speed,
                        prefixes: e.local_prefixes.clone(),
                    },
                    remote: NeighborSide {
                        interface: e.remote_interface.clone(),
                        address: e.remote_address,
                        rdma_device: e.remote_rdma_device.clone(),
                        node_guid: e.remote_node_guid.clone(),
                        sys_image_guid: e.remote_sys_image_guid.clone(),
                        speed: e.remote_speed,
                        prefixes: e.remote_prefixes.clone(),
                    },
                })
            })
            .collect()
    }

    /// Runs segment detection against the current state. May be called
    /// without external serialization (spec §4.4) -- internally it still
    /// takes the shared read lock like any other read.
    pub fn segments(&self) -> Vec<NetworkSegment> {
        let inner = self.inner.read().unwrap();
        let Some(local_id) = inner.local_machine_id.clone() else {
            return Vec::new();
        };
        let local_edges: Vec<&Edge> = inner.edges.values().collect();
        compute_segments(&local_id, &local_edges)
    }
}
