//! THE CORE: packet codec re-export, the concurrent graph store, segment
//! detection, the multicast sender/receiver, and the expiry/export
//! scheduler (spec §2 items 1, 3, 4, 5, 6).

#![warn(clippy::all)]

mod error;
mod graph;
mod net;
mod scheduler;
mod telemetry;
mod time;

pub use error::CoreError;
pub use graph::{segments_from_snapshot, Edge, EdgeKey, GraphSnapshot, GraphStore, NetworkSegment, Node};
pub use net::{run_receiver, run_sender, ReceiverConfig, SenderConfig};
pub use scheduler::{run_expiry, run_export, Exporter};
pub use telemetry::{noop as noop_telemetry, Telemetry};

// Re-exported so downstream crates don't need a direct dependency on
// `lldisc_types` just to reach the wire-format codec.
pub use lldisc_types::{decode, encode, MAX_PAYLOAD_BYTES};
