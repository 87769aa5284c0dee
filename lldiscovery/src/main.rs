//! `lldiscovery`: CLI/config bootstrap, logging init, machine-identity
//! resolution, task wiring, signal handling (spec §5, §6, §7).
//!
//! Follows `rita_bin/src/database_migration.rs`'s own `main` shape:
//! `env_logger` initialized first, config loaded and unwrapped-or-exit,
//! then the long-running work handed off. The four topology-engine tasks
//! (sender, receiver, expiry ticker, export ticker) are plain OS threads
//! joined on one shared `crossbeam` cancellation channel (spec §9: "tasks,
//! not threads... any scheduling model with timers and blocking I/O
//! suffices"); the HTTP surface runs on the `actix-web` runtime this
//! process also owns, the one place this binary needs an async runtime.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod export;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use lldisc_core::{run_expiry, run_export, run_receiver, run_sender, GraphStore, ReceiverConfig, SenderConfig};
use lldisc_iface::LinuxInterfaceSource;
use lldisc_settings::Config;
use lldisc_types::InterfaceSource;

use export::DotExporter;

/// Grace period the daemon waits after cancellation so in-flight log
/// writes flush before the process exits (spec §5).
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

#[actix_rt::main]
async fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let config = match lldisc_settings::load_from_argv(&argv) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);

    let machine_id = match lldisc_types::local_machine_id() {
        Ok(id) => id,
        Err(e) => {
            log::error!("could not resolve machine identity: {e}");
            return ExitCode::FAILURE;
        }
    };
    let hostname = resolve_hostname();

    let interface_source = LinuxInterfaceSource;
    let initial_interfaces = match interface_source.get_interfaces() {
        Ok(v) => v,
        Err(e) => {
            log::error!("could not enumerate interfaces at startup: {e}");
            return ExitCode::FAILURE;
        }
    };

    let graph = Arc::new(GraphStore::new());
    graph.set_local(machine_id.clone(), hostname.clone(), &initial_interfaces);

    let (cancel_tx, cancel_rx) = unbounded::<()>();
    install_signal_handler(cancel_tx.clone());

    // Raised by a core task's setup failure (currently only the receiver
    // can fail this way, spec §6 "Exit codes": "non-zero only for ...
    // initial telemetry/receiver setup failure"); checked once the HTTP
    // surface stops, after which we know every task has had a chance to
    // report in.
    let task_failed = Arc::new(AtomicBool::new(false));

    let handles = spawn_core_tasks(
        machine_id,
        hostname,
        &graph,
        &config,
        &cancel_rx,
        cancel_tx.clone(),
        task_failed.clone(),
    );

    let http_result = lldisc_http::serve(&config.http_address, graph.clone()).await;
    if let Err(e) = http_result {
        log::error!("http surface exited: {e}");
    }

    drop(cancel_tx);
    thread::sleep(SHUTDOWN_GRACE);
    for handle in handles {
        let _ = handle.join();
    }

    log::info!("shutdown complete");
    if task_failed.load(Ordering::SeqCst) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::default().filter(None, filter).init();
}

fn resolve_hostname() -> String {
    hostname_from_uname().unwrap_or_else(|| "unknown-host".to_string())
}

fn hostname_from_uname() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn install_signal_handler(cancel_tx: Sender<()>) {
    let result = ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        // Every task's `select!`/`recv_timeout` observes this send as an
        // immediate cancellation, whether or not it is the first signal
        // delivered -- the channel itself is only actually closed once
        // `main` drops its own sender on the shutdown path.
        let _ = cancel_tx.send(());
    });
    if let Err(e) = result {
        log::warn!("could not install signal handler: {e}");
    }
}

fn spawn_core_tasks(
    machine_id: lldisc_types::MachineId,
    hostname: String,
    graph: &Arc<GraphStore>,
    config: &Config,
    cancel_rx: &Receiver<()>,
    cancel_tx: Sender<()>,
    task_failed: Arc<AtomicBool>,
) -> Vec<thread::JoinHandle<()>> {
    let telemetry = lldisc_core::noop_telemetry();
    let mut handles = Vec::new();

    let multicast_address: std::net::Ipv6Addr = config
        .multicast_address
        .parse()
        .unwrap_or_else(|_| lldisc_settings::DEFAULT_MULTICAST_ADDRESS.parse().unwrap());

    let sender_cfg = SenderConfig {
        multicast_address,
        multicast_port: config.multicast_port,
        send_interval: Duration::from_secs(config.send_interval_secs),
        include_neighbors: config.include_neighbors,
    };
    {
        let graph = graph.clone();
        let telemetry = telemetry.clone();
        let cancel_rx = cancel_rx.clone();
        let interface_source = LinuxInterfaceSource;
        let machine_id = machine_id.clone();
        handles.push(thread::spawn(move || {
            run_sender(&machine_id, &hostname, &interface_source, &graph, telemetry.as_ref(), &sender_cfg, &cancel_rx);
        }));
    }

    let receiver_cfg = ReceiverConfig {
        multicast_address,
        multicast_port: config.multicast_port,
        include_neighbors: config.include_neighbors,
    };
    {
        let graph = graph.clone();
        let telemetry = telemetry.clone();
        let cancel_rx = cancel_rx.clone();
        let cancel_tx = cancel_tx.clone();
        let task_failed = task_failed.clone();
        let interface_source = LinuxInterfaceSource;
        let machine_id = machine_id.clone();
        handles.push(thread::spawn(move || {
            let result = run_receiver(&machine_id, &interface_source, &graph, telemetry.as_ref(), &receiver_cfg, &cancel_rx);
            if let Err(e) = result {
                log::error!("receiver task failed, raising shutdown: {e}");
                task_failed.store(true, Ordering::SeqCst);
                let _ = cancel_tx.send(());
            }
        }));
    }

    let node_timeout = Duration::from_secs(config.node_timeout_secs);
    {
        let graph = graph.clone();
        let cancel_rx = cancel_rx.clone();
        handles.push(thread::spawn(move || {
            run_expiry(&graph, node_timeout, Duration::from_secs(5), &cancel_rx);
        }));
    }

    let export_interval = Duration::from_secs(config.export_interval_secs);
    let output_file = config.resolve_output_file();
    {
        let graph = graph.clone();
        let cancel_rx = cancel_rx.clone();
        let exporter = DotExporter::new(output_file);
        handles.push(thread::spawn(move || {
            run_export(&graph, &exporter, export_interval, &cancel_rx);
        }));
    }

    handles
}
