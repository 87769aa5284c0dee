mod model;
mod segments;
mod store;

pub use model::{Edge, EdgeKey, GraphSnapshot, Node};
pub use segments::NetworkSegment;
pub use store::GraphStore;

/// Pure-function equivalent of `GraphStore::segments`, for callers (e.g.
/// the nwdiag renderer) that only have a `GraphSnapshot` -- a deep copy
/// already taken outside any lock -- and no reference to the store itself.
pub fn segments_from_snapshot(snapshot: &GraphSnapshot) -> Vec<NetworkSegment> {
    let Some(local) = snapshot.nodes.iter().find(|n| n.is_local) else {
        return Vec::new();
    };
    let edges: Vec<&Edge> = snapshot.edges.iter().collect();
    segments::compute_segments(&local.machine_id, &edges)
}
