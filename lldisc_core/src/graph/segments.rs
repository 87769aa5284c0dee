//! Network-segment detection (spec §4.5): groups the local host's direct
//! and indirect edges into shared L2 domains, merging across interfaces
//! that share a routable prefix or an identical peer set.
//!
//! No direct analogue in the teacher codebase -- Rita's `peer_listener`
//! stops at "here are my peers", it never groups them into segments. Built
//! from scratch in the small-named-helpers style `tunnel_manager::gc`
//! uses for its own multi-stage filtering.

use std::collections::{BTreeSet, HashMap, HashSet};

use lldisc_types::MachineId;

use super::model::Edge;

/// A group of three or more hosts (including the local host) sharing one
/// L2 broadcast domain (spec §3, §4.5).
#[derive(Debug, Clone)]
pub struct NetworkSegment {
    pub id: String,
    pub interface: String,
    /// First element of `network_prefixes`, kept for legacy consumers.
    pub network_prefix: Option<String>,
    pub network_prefixes: Vec<String>,
    pub connected_nodes: Vec<MachineId>,
    pub edge_info: HashMap<MachineId, Edge>,
}

/// One local-interface bucket before any merging (Stage A/B output).
#[derive(Debug, Clone)]
struct Candidate {
    interface: String,
    edge_info: HashMap<MachineId, Edge>,
    prefixes: Vec<String>,
}

pub fn compute_segments(local_id: &MachineId, edges: &[&Edge]) -> Vec<NetworkSegment> {
    let candidates = stage_a_group_by_interface(edges);
    let candidates: Vec<Candidate> = candidates
        .into_iter()
        .map(stage_b_aggregate_prefixes)
        .collect();
    let candidates = stage_c_merge_by_prefix(candidates);
    let candidates = stage_d_merge_by_node_set(candidates);
    stage_e_number(local_id, candidates)
}

/// Stage A: bucket edges by the local interface used to reach each peer.
/// A bucket needs at least two distinct peers (three nodes counting the
/// local host) to be a segment candidate; a single peer is point-to-point.
fn stage_a_group_by_interface(edges: &[&Edge]) -> Vec<Candidate> {
    let mut buckets: HashMap<String, HashMap<MachineId, Edge>> = HashMap::new();
    for edge in edges {
        let bucket = buckets.entry(edge.local_interface.clone()).or_default();
        match bucket.get(&edge.remote_machine_id) {
            Some(existing) if !more_informative(edge, existing) => {}
            _ => {
                bucket.insert(edge.remote_machine_id.clone(), (*edge).clone());
            }
        }
    }

    buckets
        .into_iter()
        .filter(|(_, peers)| peers.len() >= 2)
        .map(|(interface, edge_info)| Candidate {
            interface,
            edge_info,
            prefixes: Vec::new(),
        })
        .collect()
}

/// Preference rule used both to pick a bucket's representative edge for a
/// peer (Stage A) and to pick the surviving edge when two candidates being
/// merged both mention the same node (Stage C/D): prefer a known local
/// address over the unspecified placeholder, then non-empty local
/// prefixes, then non-empty remote prefixes, else keep the existing one.
/// This is the rule that keeps the local host's physical-interface edge
/// rather than a bridge-interface edge learned from a peer (spec §4.5).
fn more_informative(candidate: &Edge, existing: &Edge) -> bool {
    let candidate_known_local = !candidate.local_address.is_unspecified();
    let existing_known_local = !existing.local_address.is_unspecified();
    if candidate_known_local != existing_known_local {
        return candidate_known_local;
    }
    let candidate_has_local_prefixes = !candidate.local_prefixes.is_empty();
    let existing_has_local_prefixes = !existing.local_prefixes.is_empty();
    if candidate_has_local_prefixes != existing_has_local_prefixes {
        return candidate_has_local_prefixes;
    }
    let candidate_has_remote_prefixes = !candidate.remote_prefixes.is_empty();
    let existing_has_remote_prefixes = !existing.remote_prefixes.is_empty();
    if candidate_has_remote_prefixes != existing_has_remote_prefixes {
        return candidate_has_remote_prefixes;
    }
    false
}

/// Stage B: union the global prefixes observed across all participating
/// interface sides (local and remote), deduplicated and lexicographically
/// sorted for determinism.
fn stage_b_aggregate_prefixes(mut candidate: Candidate) -> Candidate {
    let mut prefixes: BTreeSet<String> = BTreeSet::new();
    for edge in candidate.edge_info.values() {
        for p in &edge.local_prefixes {
            prefixes.insert(p.to_string());
        }
        for p in &edge.remote_prefixes {
            prefixes.insert(p.to_string());
        }
    }
    candidate.prefixes = prefixes.into_iter().collect();
    candidate
}

/// Stage C: group candidates by their first prefix string; any group of
/// size >= 2 collapses into one segment. Candidates with no prefixes never
/// merge with one another here (each keeps its own interface as primary).
fn stage_c_merge_by_prefix(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut groups: HashMap<String, Vec<Candidate>> = HashMap::new();
    let mut singletons: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        match candidate.prefixes.first().cloned() {
            Some(first) => groups.entry(first).or_default().push(candidate),
            None => singletons.push(candidate),
        }
    }

    let mut result = Vec::new();
    for (_, group) in groups {
        result.push(merge_candidates(group));
    }
    result.extend(singletons);
    result
}

/// Stage D: any two (post-Stage-C) segments whose peer sets are identical
/// collapse further -- the same physical LAN seen through two naming
/// conventions (e.g. `em1` vs `br112`).
fn stage_d_merge_by_node_set(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut groups: HashMap<BTreeSet<MachineId>, Vec<Candidate>> = HashMap::new();
    for candidate in candidates {
        let key: BTreeSet<MachineId> = candidate.edge_info.keys().cloned().collect();
        groups.entry(key).or_default().push(candidate);
    }

    groups.into_values().map(merge_candidates).collect()
}

/// Merges a group of candidates into one: union of peers and prefixes, the
/// most-informative edge per peer, and a primary interface chosen by the
/// mode of `remote_speed` across every contributing edge (WiFi-at-zero
/// substituted to 100 Mbit/s for this purpose only), ties broken toward a
/// wired interface name.
fn merge_candidates(group: Vec<Candidate>) -> Candidate {
    if group.len() == 1 {
        return group.into_iter().next().unwrap();
    }

    let mut edge_info: HashMap<MachineId, Edge> = HashMap::new();
    let mut prefixes: BTreeSet<String> = BTreeSet::new();
    let mut all_edges: Vec<Edge> = Vec::new();
    let mut member_interfaces: HashSet<String> = HashSet::new();

    for member in &group {
        member_interfaces.insert(member.interface.clone());
        for p in &member.prefixes {
            prefixes.insert(p.clone());
        }
        for (peer, edge) in &member.edge_info {
            all_edges.push(edge.clone());
            match edge_info.get(peer) {
                Some(existing) if !more_informative(edge, existing) => {}
                _ => {
                    edge_info.insert(peer.clone(), edge.clone());
                }
            }
        }
    }

    let interface = choose_primary_interface(&member_interfaces, &all_edges);

    Candidate {
        interface,
        edge_info,
        prefixes: prefixes.into_iter().collect(),
    }
}

fn choose_primary_interface(candidate_interfaces: &HashSet<String>, edges: &[Edge]) -> String {
    if candidate_interfaces.len() == 1 {
        return candidate_interfaces.iter().next().cloned().unwrap();
    }

    // Mode of effective remote_speed across all contributing edges.
    let mut speed_counts: HashMap<u32, usize> = HashMap::new();
    for edge in edges {
        *speed_counts.entry(effective_speed(edge)).or_insert(0) += 1;
    }
    let max_count = speed_counts.values().copied().max().unwrap_or(0);
    let mode_speeds: HashSet<u32> = speed_counts
        .into_iter()
        .filter(|(_, c)| *c == max_count)
        .map(|(s, _)| s)
        .collect();

    // Among interfaces that have at least one edge matching a mode speed,
    // prefer a wired name; otherwise fall back to the first interface in
    // sorted order for determinism.
    let mut qualifying: Vec<&String> = candidate_interfaces
        .iter()
        .filter(|iface| {
            edges
                .iter()
                .any(|e| &e.local_interface == *iface && mode_speeds.contains(&effective_speed(e)))
        })
        .collect();
    qualifying.sort();

    qualifying
        .iter()
        .find(|iface| is_wired(iface))
        .or_else(|| qualifying.first())
        .map(|s| s.to_string())
        .unwrap_or_else(|| candidate_interfaces.iter().min().cloned().unwrap_or_default())
}

/// WiFi interfaces reporting speed 0 are treated as 100 Mbit/s for
/// segment-primary selection and display only; the stored speed is never
/// mutated (spec §8 boundary case).
fn effective_speed(edge: &Edge) -> u32 {
    let raw = edge.remote_speed.unwrap_or(0);
    if raw == 0 && !is_wired(&edge.remote_interface) {
        100
    } else {
        raw
    }
}

fn is_wired(interface_name: &str) -> bool {
    !interface_name.starts_with("wl")
}

/// Stage E: deterministic numbering by (first prefix, then primary
/// interface).
fn stage_e_number(local_id: &MachineId, candidates: Vec<Candidate>) -> Vec<NetworkSegment> {
    let mut candidates = candidates;
    candidates.sort_by(|a, b| {
        let a_key = (a.prefixes.first().cloned().unwrap_or_default(), a.interface.clone());
        let b_key = (b.prefixes.first().cloned().unwrap_or_default(), b.interface.clone());
        a_key.cmp(&b_key)
    });

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let mut connected_nodes: Vec<MachineId> = candidate.edge_info.keys().cloned().collect();
            connected_nodes.sort();
            connected_nodes.insert(0, local_id.clone());
            NetworkSegment {
                id: format!("segment_{i}"),
                interface: candidate.interface,
                network_prefix: candidate.prefixes.first().cloned(),
                network_prefixes: candidate.prefixes,
                connected_nodes,
                edge_info: candidate.edge_info,
            }
        })
        .collect()
}
