//! Multicast sender (spec §4.2). Grounded on the teacher's
//! `peer_listener::send_im_here`, generalized from one fixed broadcast
//! payload to a full `Advertisement` and from a single shared socket to one
//! ephemeral socket per interface per cycle, as the spec requires.

use std::net::{Ipv6Addr, SocketAddrV6, UdpSocket};
use std::time::Duration;

use crossbeam::channel::{select, tick, Receiver};
use lldisc_types::{Advertisement, InterfaceSource, LocalInterface, MachineId, NeighborRecord};

use super::ifindex::ifindex_for;
use crate::error::CoreError;
use crate::graph::GraphStore;
use crate::telemetry::Telemetry;
use crate::time::unix_timestamp_now;

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub multicast_address: Ipv6Addr,
    pub multicast_port: u16,
    pub send_interval: Duration,
    pub include_neighbors: bool,
}

/// Runs the sender loop until `cancel` fires. The first advertisement goes
/// out immediately, not after one interval (spec §4.2).
#[allow(clippy::too_many_arguments)]
pub fn run(
    machine_id: &MachineId,
    hostname: &str,
    interface_source: &dyn InterfaceSource,
    graph: &GraphStore,
    telemetry: &dyn Telemetry,
    cfg: &SenderConfig,
    cancel: &Receiver<()>,
) {
    let ticks = tick(cfg.send_interval);
    send_cycle(machine_id, hostname, interface_source, graph, telemetry, cfg);

    loop {
        select! {
            recv(cancel) -> _ => {
                log::info!("sender exiting on cancellation");
                return;
            }
            recv(ticks) -> _ => {
                send_cycle(machine_id, hostname, interface_source, graph, telemetry, cfg);
            }
        }
    }
}

fn send_cycle(
    machine_id: &MachineId,
    hostname: &str,
    interface_source: &dyn InterfaceSource,
    graph: &GraphStore,
    telemetry: &dyn Telemetry,
    cfg: &SenderConfig,
) {
    let interfaces = match interface_source.get_interfaces() {
        Ok(v) => v,
        Err(e) => {
            log::warn!("skipping send cycle, failed to enumerate interfaces: {e}");
            telemetry.counter("send_errors", 1, "get_interfaces");
            return;
        }
    };

    // Neighbors learned indirectly must never be re-advertised (spec
    // §4.2): `neighbor_records` only walks direct edges.
    let neighbors = if cfg.include_neighbors {
        let records = graph.neighbor_records();
        if records.is_empty() {
            None
        } else {
            Some(records)
        }
    } else {
        None
    };

    for iface in &interfaces {
        if let Err(e) = send_on_interface(machine_id, hostname, iface, neighbors.clone(), cfg) {
            log::warn!("send on interface {} failed: {e}", iface.name);
            telemetry.counter("send_errors", 1, &iface.name);
        }
    }
}

fn send_on_interface(
    machine_id: &MachineId,
    hostname: &str,
    iface: &LocalInterface,
    neighbors: Option<Vec<NeighborRecord>>,
    cfg: &SenderConfig,
) -> Result<(), CoreError> {
    let ifindex = ifindex_for(&iface.name)?;

    let bind_addr = SocketAddrV6::new(iface.link_local, 0, 0, ifindex);
    let socket = UdpSocket::bind(bind_addr)?;
    let dest = SocketAddrV6::new(cfg.multicast_address, cfg.multicast_port, 0, ifindex);
    socket.connect(dest)?;

    let ad = Advertisement {
        machine_id: machine_id.clone(),
        hostname: hostname.to_string(),
        timestamp: unix_timestamp_now(),
        interface: iface.name.clone(),
        source_ip: iface.link_local,
        rdma_device: iface.rdma_device.clone(),
        node_guid: iface.node_guid.clone(),
        sys_image_guid: iface.sys_image_guid.clone(),
        speed: iface.speed,
        global_prefixes: iface.global_prefixes.clone(),
        neighbors,
    };

    let payload = lldisc_types::encode(&ad)?;
    socket.send(&payload)?;
    log::trace!(
        "sent advertisement on {} ({} bytes) to {}",
        iface.name,
        payload.len(),
        dest
    );
    Ok(())
}
