#![warn(clippy::all)]
#![forbid(unsafe_code)]

//! Wire format and shared data model for `lldiscovery`.
//!
//! Everything here is inert data plus the codec that turns it into/out of
//! a single UDP datagram (spec §3, §4.1, §6). No networking, no locking --
//! those live in `lldisc_core`.

mod codec;
mod error;
mod identity;
mod interface_source;
mod model;

pub use codec::{decode, encode, MAX_PAYLOAD_BYTES};
pub use error::TypesError;
pub use identity::local_machine_id;
pub use interface_source::{InterfaceSource, InterfaceSourceError};
pub use model::{
    Advertisement, InterfaceDetails, LocalInterface, MachineId, NeighborRecord, NeighborSide,
};
