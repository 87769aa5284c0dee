//! Graphviz DOT renderer.

use std::fmt::Write as _;

use lldisc_core::{Edge, GraphSnapshot, Node};

/// Renders a snapshot as a Graphviz DOT digraph: one node per host, one
/// edge per observed reachability pair. Direct edges are drawn solid,
/// indirect (neighbor-learned) edges dashed and labeled with the
/// intermediary that reported them.
pub fn render_dot(snapshot: &GraphSnapshot) -> String {
    let mut out = String::new();
    out.push_str("digraph lldiscovery {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"monospace\"];\n\n");

    for node in &snapshot.nodes {
        writeln!(out, "  {};", format_node(node)).unwrap();
    }
    out.push('\n');

    let mut edges = snapshot.edges.clone();
    edges.sort_by(|a, b| {
        (a.local_interface.as_str(), a.remote_machine_id.as_str(), a.remote_interface.as_str()).cmp(&(
            b.local_interface.as_str(),
            b.remote_machine_id.as_str(),
            b.remote_interface.as_str(),
        ))
    });
    for edge in &edges {
        writeln!(out, "  {}", format_edge(snapshot, edge)).unwrap();
    }

    out.push_str("}\n");
    out
}

fn format_node(node: &Node) -> String {
    let label = if node.is_local {
        format!("{} (local)", node.hostname)
    } else {
        node.hostname.clone()
    };
    format!(
        "\"{}\" [label=\"{}\"]",
        escape(node.machine_id.as_str()),
        escape(&label)
    )
}

fn format_edge(snapshot: &GraphSnapshot, edge: &Edge) -> String {
    let local_id = snapshot
        .nodes
        .iter()
        .find(|n| n.is_local)
        .map(|n| n.machine_id.as_str().to_string())
        .unwrap_or_default();

    let style = if edge.direct { "solid" } else { "dashed" };
    let mut label = format!("{}->{}", edge.local_interface, edge.remote_interface);
    if let Some(speed) = edge.remote_speed {
        let _ = write!(label, " ({speed} Mbit/s)");
    }
    if let Some(via) = &edge.learned_from {
        let _ = write!(label, " via {via}");
    }

    format!(
        "\"{}\" -> \"{}\" [style={}, label=\"{}\"];",
        escape(&local_id),
        escape(edge.remote_machine_id.as_str()),
        style,
        escape(&label)
    )
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lldisc_core::GraphStore;
    use lldisc_types::{Advertisement, LocalInterface, MachineId};
    use std::net::Ipv6Addr;

    fn local_iface() -> LocalInterface {
        LocalInterface {
            name: "eth0".into(),
            link_local: "fe80::1".parse().unwrap(),
            global_prefixes: vec![],
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: Some(1000),
        }
    }

    fn peer_ad() -> Advertisement {
        Advertisement {
            machine_id: MachineId("peer".into()),
            hostname: "peer-host".into(),
            timestamp: 1,
            interface: "eth0".into(),
            source_ip: "fe80::2".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: Some(1000),
            global_prefixes: vec![],
            neighbors: None,
        }
    }

    #[test]
    fn renders_local_node_and_direct_edge() {
        let graph = GraphStore::new();
        graph.set_local(MachineId("local".into()), "local-host".into(), &[local_iface()]);
        graph.record_direct(&peer_ad(), "fe80::2".parse::<Ipv6Addr>().unwrap(), "eth0");

        let snapshot = graph.snapshot();
        let dot = render_dot(&snapshot);

        assert!(dot.contains("digraph lldiscovery"));
        assert!(dot.contains("local-host (local)"));
        assert!(dot.contains("peer-host"));
        assert!(dot.contains("style=solid"));
    }
}
