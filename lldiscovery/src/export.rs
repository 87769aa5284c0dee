//! Adapts `lldisc_render`'s pure DOT renderer and atomic-write helper to
//! the `lldisc_core::scheduler::Exporter` trait the export ticker calls.

use lldisc_core::{CoreError, Exporter, GraphSnapshot};
use lldisc_render::{render_dot, write_atomic};

pub struct DotExporter {
    output_file: String,
}

impl DotExporter {
    pub fn new(output_file: String) -> DotExporter {
        DotExporter { output_file }
    }
}

impl Exporter for DotExporter {
    fn export(&self, snapshot: &GraphSnapshot) -> Result<(), CoreError> {
        let dot = render_dot(snapshot);
        write_atomic(&self.output_file, &dot).map_err(|e| CoreError::Io(std::io::Error::other(e.to_string())))
    }
}
