//! Expiry and export tickers (spec §2 item 6, §5). Two independent,
//! cancellable loops; the export side is parameterized over an `Exporter`
//! so this crate never has to depend on the rendering crate (which itself
//! depends on `GraphSnapshot` from here -- a hard dependency the other way
//! would be circular).

use std::time::Duration;

use crossbeam::channel::{select, tick, Receiver};

use crate::error::CoreError;
use crate::graph::{GraphSnapshot, GraphStore};

/// The write-to-disk side of an export cycle. `lldiscovery`'s binary wires
/// this to `lldisc_render`'s DOT renderer plus its atomic-write helper.
pub trait Exporter: Send + Sync {
    fn export(&self, snapshot: &GraphSnapshot) -> Result<(), CoreError>;
}

/// Removes nodes whose last advertisement is older than `node_timeout`,
/// once per `tick_interval`, until `cancel` fires.
pub fn run_expiry(graph: &GraphStore, node_timeout: Duration, tick_interval: Duration, cancel: &Receiver<()>) {
    let ticks = tick(tick_interval);
    loop {
        select! {
            recv(cancel) -> _ => {
                log::info!("expiry ticker exiting on cancellation");
                return;
            }
            recv(ticks) -> _ => {
                let removed = graph.remove_expired(node_timeout);
                if removed > 0 {
                    log::info!("expired {removed} node(s) after {node_timeout:?} of silence");
                }
            }
        }
    }
}

/// Every `tick_interval`, exports the graph if it has changed since the
/// last successful export. Export failures are logged at error and the
/// change flag is left raised so the next tick retries (spec §7).
pub fn run_export(
    graph: &GraphStore,
    exporter: &dyn Exporter,
    tick_interval: Duration,
    cancel: &Receiver<()>,
) {
    let ticks = tick(tick_interval);
    loop {
        select! {
            recv(cancel) -> _ => {
                log::info!("export ticker exiting on cancellation");
                return;
            }
            recv(ticks) -> _ => {
                if !graph.has_changes() {
                    continue;
                }
                let snapshot = graph.snapshot();
                match exporter.export(&snapshot) {
                    Ok(()) => {
                        graph.clear_changes();
                        log::debug!("exported topology snapshot");
                    }
                    Err(e) => {
                        log::error!("export failed, will retry next cycle: {e}");
                    }
                }
            }
        }
    }
}
