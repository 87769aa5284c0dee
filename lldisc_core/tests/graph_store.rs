//! End-to-end scenarios from spec §8, exercised directly against
//! `GraphStore` without any networking -- the sender/receiver modules are
//! thin adapters around exactly these calls.

use std::thread::sleep;
use std::time::Duration;

use lldisc_core::GraphStore;
use lldisc_types::{Advertisement, LocalInterface, MachineId, NeighborRecord, NeighborSide};

fn local_iface(name: &str, addr: &str) -> LocalInterface {
    LocalInterface {
        name: name.to_string(),
        link_local: addr.parse().unwrap(),
        global_prefixes: vec![],
        rdma_device: None,
        node_guid: None,
        sys_image_guid: None,
        speed: Some(1000),
    }
}

fn ad(id: &str, host: &str, iface: &str, src: &str, prefix: Option<&str>) -> Advertisement {
    Advertisement {
        machine_id: MachineId(id.to_string()),
        hostname: host.to_string(),
        timestamp: 1_700_000_000,
        interface: iface.to_string(),
        source_ip: src.parse().unwrap(),
        rdma_device: None,
        node_guid: None,
        sys_image_guid: None,
        speed: Some(1000),
        global_prefixes: prefix.map(|p| vec![p.parse().unwrap()]).unwrap_or_default(),
        neighbors: None,
    }
}

/// Scenario 1: triangle on one interface -- three hosts sharing `eth0` and
/// a prefix form exactly one segment.
#[test]
fn triangle_on_one_interface_forms_one_segment() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", Some("10.0.0.0/24")), "fe80::b".parse().unwrap(), "eth0");
    graph.record_direct(&ad("c", "host-c", "eth0", "fe80::c", Some("10.0.0.0/24")), "fe80::c".parse().unwrap(), "eth0");

    let segments = graph.segments();
    assert_eq!(segments.len(), 1);
    let segment = &segments[0];
    assert_eq!(segment.interface, "eth0");
    assert_eq!(segment.network_prefixes, vec!["10.0.0.0/24".to_string()]);
    let mut nodes: Vec<String> = segment.connected_nodes.iter().map(|m| m.as_str().to_string()).collect();
    nodes.sort();
    assert_eq!(nodes, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

/// Scenario 2: a single peer on one interface is point-to-point, not a
/// segment -- but the edge is still present in the graph.
#[test]
fn point_to_point_is_not_a_segment() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", None), "fe80::b".parse().unwrap(), "eth0");

    assert!(graph.segments().is_empty());
    let snapshot = graph.snapshot();
    assert_eq!(snapshot.edges.len(), 1);
}

/// Scenario 3: transitive discovery -- A hears B directly; B's
/// advertisement carries a neighbor record for C, which A turns into an
/// indirect edge.
#[test]
fn transitive_discovery_via_neighbor_record() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);

    let mut ad_b = ad("b", "host-b", "eth0", "fe80::b", None);
    ad_b.neighbors = Some(vec![NeighborRecord {
        machine_id: MachineId("c".into()),
        hostname: "host-c".into(),
        local: NeighborSide {
            interface: "br0".into(),
            address: "fe80::b2".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
        remote: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::c".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
    }]);

    graph.record_direct(&ad_b, "fe80::b".parse().unwrap(), "eth0");
    for neighbor in ad_b.neighbors.as_ref().unwrap() {
        graph.record_indirect(neighbor, MachineId("b".into()));
    }

    let snapshot = graph.snapshot();
    let c = snapshot.nodes.iter().find(|n| n.machine_id.as_str() == "c");
    assert!(c.is_some());
    let edge = snapshot.edges.iter().find(|e| e.remote_machine_id.as_str() == "c").unwrap();
    assert!(!edge.direct);
    assert_eq!(edge.learned_from.as_ref().map(|m| m.as_str()), Some("b"));
}

/// Scenario 4: expiry -- a node silent past `node_timeout` is removed,
/// along with its edges, and the change flag is raised.
#[test]
fn expiry_removes_silent_node_and_its_edges() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", None), "fe80::b".parse().unwrap(), "eth0");
    graph.clear_changes();

    sleep(Duration::from_millis(120));
    let removed = graph.remove_expired(Duration::from_millis(50));

    assert_eq!(removed, 1);
    assert!(graph.has_changes());
    let snapshot = graph.snapshot();
    assert!(snapshot.nodes.iter().all(|n| n.machine_id.as_str() != "b"));
    assert!(snapshot.edges.is_empty());
}

/// Not-yet-expired boundary: strictly less than the timeout never removes.
#[test]
fn node_within_timeout_survives() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", None), "fe80::b".parse().unwrap(), "eth0");

    let removed = graph.remove_expired(Duration::from_secs(120));
    assert_eq!(removed, 0);
    assert_eq!(graph.snapshot().nodes.len(), 2);
}

/// Scenario 6: loopback suppression -- an advertisement naming the local
/// machine id is dropped silently, even when it is disguised as a
/// neighbor record.
#[test]
fn loopback_suppression_drops_self_advertisement_and_self_neighbor() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);

    let self_ad = ad("a", "host-a", "eth1", "fe80::a2", None);
    graph.record_direct(&self_ad, "fe80::a2".parse().unwrap(), "eth1");

    let self_neighbor = NeighborRecord {
        machine_id: MachineId("a".into()),
        hostname: "host-a".into(),
        local: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::b".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
        remote: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::a".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
    };
    graph.record_indirect(&self_neighbor, MachineId("b".into()));

    let snapshot = graph.snapshot();
    assert_eq!(snapshot.nodes.len(), 1);
    assert!(snapshot.nodes[0].is_local);
    assert!(snapshot.edges.is_empty());
}

/// Invariant: direct edges are never downgraded once set, regardless of
/// call order between `record_direct` and `record_indirect`.
#[test]
fn direct_edge_is_never_downgraded_by_later_indirect_observation() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", None), "fe80::b".parse().unwrap(), "eth0");

    let neighbor = NeighborRecord {
        machine_id: MachineId("b".into()),
        hostname: "host-b".into(),
        local: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::a".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
        remote: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::b".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
    };
    graph.record_indirect(&neighbor, MachineId("z".into()));

    let snapshot = graph.snapshot();
    let edge = snapshot.edges.iter().find(|e| e.remote_machine_id.as_str() == "b").unwrap();
    assert!(edge.direct);
    assert!(edge.learned_from.is_none());
}

/// An indirect observation that collides with an existing direct edge's key
/// must not clobber the peer node's interface map, even though the edge
/// itself is correctly left alone (spec §4.4/§9 "direct supersedes
/// indirect" -- this applies to the whole upsert, not just the edge).
#[test]
fn indirect_observation_does_not_clobber_node_interface_when_edge_is_direct() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);

    let mut direct_ad = ad("b", "host-b", "eth0", "fe80::b", Some("10.0.0.5/24"));
    direct_ad.hostname = "host-b".into();
    graph.record_direct(&direct_ad, "fe80::b".parse().unwrap(), "eth0");

    let forged_neighbor = NeighborRecord {
        machine_id: MachineId("b".into()),
        hostname: "host-b-forged".into(),
        local: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::a".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
        remote: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::b".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec!["6.6.6.6/32".parse().unwrap()],
        },
    };
    graph.record_indirect(&forged_neighbor, MachineId("c".into()));

    let snapshot = graph.snapshot();
    let node = snapshot.nodes.iter().find(|n| n.machine_id.as_str() == "b").unwrap();
    assert_eq!(node.hostname, "host-b");
    let iface = node.interfaces.get("eth0").unwrap();
    assert_eq!(iface.global_prefixes, vec!["10.0.0.5/24".parse().unwrap()]);

    let edge = snapshot.edges.iter().find(|e| e.remote_machine_id.as_str() == "b").unwrap();
    assert!(edge.direct);
    assert!(edge.learned_from.is_none());
}

/// Indirect-then-direct ordering also yields `direct=true` (spec §8,
/// property 3, reverse ordering).
#[test]
fn indirect_then_direct_also_yields_direct_true() {
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("eth0", "fe80::a")]);

    let neighbor = NeighborRecord {
        machine_id: MachineId("b".into()),
        hostname: "host-b".into(),
        local: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::a".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
        remote: NeighborSide {
            interface: "eth0".into(),
            address: "fe80::b".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        },
    };
    graph.record_indirect(&neighbor, MachineId("z".into()));
    graph.record_direct(&ad("b", "host-b", "eth0", "fe80::b", None), "fe80::b".parse().unwrap(), "eth0");

    let snapshot = graph.snapshot();
    let edge = snapshot.edges.iter().find(|e| e.remote_machine_id.as_str() == "b").unwrap();
    assert!(edge.direct);
    assert!(edge.learned_from.is_none());
}

/// Scenario 5: merge by identical node set -- the same 5-node LAN seen
/// once via `em1` and once via `br112` collapses into one segment with
/// the wired interface preferred as primary.
#[test]
fn merge_by_identical_node_set_prefers_wired_interface() {
    // Same four peers reachable via both em1 (direct) and br112 (indirect,
    // from an intermediary) so stage D sees two candidates with the same
    // connected-node set and collapses them, preferring the wired name.
    let peers = ["p1", "p2", "p3", "p4"];
    // The bridge reports a different synthetic speed for every peer (no
    // single value reaches the mode), while the physical link reports the
    // same speed for all four -- so the mode uniquely picks `em1`, without
    // relying on any wired-vs-bridge name heuristic to break a tie.
    let bridge_speeds = [9000u32, 9500, 11000, 12000];
    let graph = GraphStore::new();
    graph.set_local(MachineId("a".into()), "host-a".into(), &[local_iface("em1", "fe80::a")]);
    for (p, bridge_speed) in peers.into_iter().zip(bridge_speeds) {
        let mut direct_ad = ad(p, &format!("host-{p}"), "em1", &format!("fe80::{p}"), Some("10.102.73.0/24"));
        direct_ad.speed = Some(1000);
        graph.record_direct(&direct_ad, direct_ad.source_ip, "em1");

        let neighbor = NeighborRecord {
            machine_id: MachineId(p.to_string()),
            hostname: format!("host-{p}"),
            local: NeighborSide {
                interface: "br112".into(),
                address: "fe80::abr".parse().unwrap(),
                rdma_device: None,
                node_guid: None,
                sys_image_guid: None,
                speed: Some(bridge_speed),
                prefixes: vec!["10.102.73.0/24".parse().unwrap()],
            },
            remote: NeighborSide {
                interface: "br112".into(),
                address: format!("fe80::{p}").parse().unwrap(),
                rdma_device: None,
                node_guid: None,
                sys_image_guid: None,
                speed: Some(bridge_speed),
                prefixes: vec!["10.102.73.0/24".parse().unwrap()],
            },
        };
        graph.record_indirect(&neighbor, MachineId("intermediary".into()));
    }

    let segments = graph.segments();
    assert_eq!(segments.len(), 1, "identical node sets across em1/br112 must collapse to one segment");
    assert_eq!(segments[0].interface, "em1");
    assert_eq!(segments[0].network_prefixes, vec!["10.102.73.0/24".to_string()]);
}
