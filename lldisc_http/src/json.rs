//! JSON-serializable view of a `GraphSnapshot`. `lldisc_core::Node` carries
//! an `Instant` (not serializable, and not meaningful off-host); this
//! module converts it to an elapsed-seconds figure at response-build time,
//! the only lossy step in an otherwise field-for-field mirror.

use serde_derive::Serialize;

use lldisc_core::{segments_from_snapshot, Edge, GraphSnapshot, NetworkSegment, Node};

#[derive(Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub segments: Vec<SegmentView>,
}

#[derive(Serialize)]
pub struct NodeView {
    pub machine_id: String,
    pub hostname: String,
    pub is_local: bool,
    pub last_seen_secs_ago: u64,
    pub interfaces: Vec<InterfaceView>,
}

#[derive(Serialize)]
pub struct InterfaceView {
    pub name: String,
    pub link_local: String,
    pub global_prefixes: Vec<String>,
    pub rdma_device: Option<String>,
    pub speed: Option<u32>,
}

#[derive(Serialize)]
pub struct EdgeView {
    pub remote_machine_id: String,
    pub local_interface: String,
    pub remote_interface: String,
    pub direct: bool,
    pub learned_from: Option<String>,
}

#[derive(Serialize)]
pub struct SegmentView {
    pub id: String,
    pub interface: String,
    pub network_prefixes: Vec<String>,
    pub connected_nodes: Vec<String>,
}

pub fn build(snapshot: &GraphSnapshot) -> GraphView {
    GraphView {
        nodes: snapshot.nodes.iter().map(node_view).collect(),
        edges: snapshot.edges.iter().map(edge_view).collect(),
        segments: segments_from_snapshot(snapshot).iter().map(segment_view).collect(),
    }
}

fn node_view(node: &Node) -> NodeView {
    let mut interfaces: Vec<InterfaceView> = node
        .interfaces
        .iter()
        .map(|(name, details)| InterfaceView {
            name: name.clone(),
            link_local: details.link_local.to_string(),
            global_prefixes: details.global_prefixes.iter().map(|p| p.to_string()).collect(),
            rdma_device: details.rdma_device.clone(),
            speed: details.speed,
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));

    NodeView {
        machine_id: node.machine_id.as_str().to_string(),
        hostname: node.hostname.clone(),
        is_local: node.is_local,
        last_seen_secs_ago: node.last_seen.elapsed().as_secs(),
        interfaces,
    }
}

fn edge_view(edge: &Edge) -> EdgeView {
    EdgeView {
        remote_machine_id: edge.remote_machine_id.as_str().to_string(),
        local_interface: edge.local_interface.clone(),
        remote_interface: edge.remote_interface.clone(),
        direct: edge.direct,
        learned_from: edge.learned_from.as_ref().map(|m| m.as_str().to_string()),
    }
}

fn segment_view(segment: &NetworkSegment) -> SegmentView {
    SegmentView {
        id: segment.id.clone(),
        interface: segment.interface.clone(),
        network_prefixes: segment.network_prefixes.clone(),
        connected_nodes: segment.connected_nodes.iter().map(|m| m.as_str().to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lldisc_core::GraphStore;
    use lldisc_types::{LocalInterface, MachineId};

    #[test]
    fn builds_view_with_local_node() {
        let graph = GraphStore::new();
        graph.set_local(
            MachineId("local".into()),
            "local-host".into(),
            &[LocalInterface {
                name: "eth0".into(),
                link_local: "fe80::1".parse().unwrap(),
                global_prefixes: vec![],
                rdma_device: None,
                node_guid: None,
                sys_image_guid: None,
                speed: Some(1000),
            }],
        );
        let view = build(&graph.snapshot());
        assert_eq!(view.nodes.len(), 1);
        assert!(view.nodes[0].is_local);
        assert_eq!(view.nodes[0].interfaces[0].name, "eth0");
    }
}
