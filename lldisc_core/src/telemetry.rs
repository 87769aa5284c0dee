//! Spec §1 lists "structured logger and telemetry meters/tracers (opaque
//! counter and span sinks)" as an external collaborator. This trait is the
//! contract the sender/receiver/scheduler call into; a no-op default keeps
//! the daemon runnable without wiring a real metrics backend.

use std::sync::Arc;

pub trait Telemetry: Send + Sync {
    /// Increments a named counter, with a single label attribute (e.g.
    /// `send_errors{interface=eth0}`, `multicast_join_failures{interface=wlan0}`).
    fn counter(&self, name: &str, value: u64, attribute: &str);
}

#[derive(Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn counter(&self, _name: &str, _value: u64, _attribute: &str) {}
}

pub fn noop() -> Arc<dyn Telemetry> {
    Arc::new(NoopTelemetry)
}
