#![warn(clippy::all)]
#![forbid(unsafe_code)]

//! DOT and nwdiag renderers: pure functions of a `GraphSnapshot` (spec §1,
//! "DOT and nwdiag renderers (pure functions of a snapshot)"), plus the
//! write-to-temporary-then-rename helper the export scheduler calls
//! (spec §5, "readers never observe a torn file").
//!
//! No direct Rita analogue -- Rita never renders its peer graph. Written
//! as small free functions in the teacher's "few abstractions" style,
//! over `lldisc_core::GraphSnapshot` and `NetworkSegment` directly.

mod dot;
mod error;
mod nwdiag;
mod write;

pub use dot::render_dot;
pub use error::RenderError;
pub use nwdiag::render_nwdiag;
pub use write::write_atomic;
