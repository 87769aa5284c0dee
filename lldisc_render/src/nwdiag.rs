//! nwdiag (blockdiag-family network diagram) renderer: one `network` block
//! per detected segment, listing each connected host's interface address.

use std::fmt::Write as _;

use lldisc_core::{segments_from_snapshot, GraphSnapshot, NetworkSegment, Node};

pub fn render_nwdiag(snapshot: &GraphSnapshot) -> String {
    let segments = segments_from_snapshot(snapshot);

    let mut out = String::new();
    out.push_str("nwdiag {\n");

    for segment in &segments {
        render_segment(&mut out, snapshot, segment);
    }

    out.push_str("}\n");
    out
}

fn render_segment(out: &mut String, snapshot: &GraphSnapshot, segment: &NetworkSegment) {
    writeln!(out, "  network {} {{", segment.id).unwrap();
    if let Some(prefix) = &segment.network_prefix {
        writeln!(out, "    address = \"{}\"", escape(prefix)).unwrap();
    }

    for node_id in &segment.connected_nodes {
        let Some(node) = find_node(snapshot, node_id) else {
            continue;
        };
        let label = host_label(node);
        let address = segment
            .edge_info
            .get(node_id)
            .map(|e| e.remote_address.to_string())
            .or_else(|| node.interfaces.get(&segment.interface).map(|i| i.link_local.to_string()));

        match address {
            Some(addr) => writeln!(
                out,
                "    {} [address = \"{}\"];",
                escape(&label),
                escape(&addr)
            )
            .unwrap(),
            None => writeln!(out, "    {};", escape(&label)).unwrap(),
        }
    }

    out.push_str("  }\n");
}

fn find_node<'a>(snapshot: &'a GraphSnapshot, id: &lldisc_types::MachineId) -> Option<&'a Node> {
    snapshot.nodes.iter().find(|n| &n.machine_id == id)
}

fn host_label(node: &Node) -> String {
    if node.is_local {
        format!("{}_local", sanitize(&node.hostname))
    } else {
        sanitize(&node.hostname)
    }
}

/// nwdiag node identifiers are bare words; non-alphanumeric characters in a
/// hostname are folded to underscores so the label stays a valid token.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
