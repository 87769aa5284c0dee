#![warn(clippy::all)]
#![forbid(unsafe_code)]

//! The CLI flag / JSON config loader. Spec §1 lists this as an external
//! collaborator supplying one `Config` value; this crate implements it for
//! real so the binary has something to load at startup.

mod error;

pub use error::SettingsError;

use std::fs;
use std::path::Path;

use docopt::Docopt;
use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_MULTICAST_ADDRESS: &str = "ff02::4c4c:6469";
pub const DEFAULT_MULTICAST_PORT: u16 = 9999;
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_EXPORT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_OUTPUT_FILE: &str = "/var/lib/lldiscovery/topology.dot";
pub const FALLBACK_OUTPUT_FILE: &str = "./topology.dot";
pub const DEFAULT_HTTP_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The one `Config` value every task is constructed from. Loaded once at
/// startup; never mutated afterward (spec §9: "the graph is injected as a
/// first-class value" -- the same discipline applies to config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_send_interval_secs")]
    pub send_interval_secs: u64,
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,
    #[serde(default = "default_export_interval_secs")]
    pub export_interval_secs: u64,
    #[serde(default = "default_multicast_address")]
    pub multicast_address: String,
    #[serde(default = "default_multicast_port")]
    pub multicast_port: u16,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_http_address")]
    pub http_address: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub include_neighbors: bool,
    /// Opaque block passed through to the telemetry collaborator untouched.
    #[serde(default)]
    pub telemetry: serde_json::Value,
}

fn default_send_interval_secs() -> u64 {
    DEFAULT_SEND_INTERVAL_SECS
}
fn default_node_timeout_secs() -> u64 {
    DEFAULT_NODE_TIMEOUT_SECS
}
fn default_export_interval_secs() -> u64 {
    DEFAULT_EXPORT_INTERVAL_SECS
}
fn default_multicast_address() -> String {
    DEFAULT_MULTICAST_ADDRESS.to_string()
}
fn default_multicast_port() -> u16 {
    DEFAULT_MULTICAST_PORT
}
fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}
fn default_http_address() -> String {
    DEFAULT_HTTP_ADDRESS.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            send_interval_secs: DEFAULT_SEND_INTERVAL_SECS,
            node_timeout_secs: DEFAULT_NODE_TIMEOUT_SECS,
            export_interval_secs: DEFAULT_EXPORT_INTERVAL_SECS,
            multicast_address: DEFAULT_MULTICAST_ADDRESS.to_string(),
            multicast_port: DEFAULT_MULTICAST_PORT,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            http_address: DEFAULT_HTTP_ADDRESS.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            include_neighbors: false,
            telemetry: serde_json::Value::Null,
        }
    }
}

impl Config {
    /// Enforces the one cross-field invariant spec §6 calls out: node
    /// timeout must exceed at least two send intervals, otherwise a node
    /// could expire between two scheduled advertisements from a live peer.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.node_timeout_secs <= 2 * self.send_interval_secs {
            return Err(SettingsError::Invalid(format!(
                "node_timeout ({}) must exceed at least two send intervals ({})",
                self.node_timeout_secs,
                2 * self.send_interval_secs
            )));
        }
        Ok(())
    }

    /// Resolves the output file, falling back to the current directory
    /// when the configured directory is not writable (spec §6).
    pub fn resolve_output_file(&self) -> String {
        let configured = Path::new(&self.output_file);
        if let Some(parent) = configured.parent() {
            if !parent.as_os_str().is_empty() && directory_is_writable(parent) {
                return self.output_file.clone();
            }
        }
        FALLBACK_OUTPUT_FILE.to_string()
    }
}

fn directory_is_writable(dir: &Path) -> bool {
    if !dir.exists() {
        return fs::create_dir_all(dir).is_ok();
    }
    let probe = dir.join(".lldiscovery-write-probe");
    match fs::write(&probe, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

const USAGE: &str = "
lldiscovery: link-layer topology discovery daemon.

Usage:
  lldiscovery [options]
  lldiscovery (-h | --help)

Options:
  -h --help                    Show this help.
  --config <path>               Path to a JSON config file.
  --send-interval <secs>         Advertisement send interval, in seconds.
  --node-timeout <secs>          Remote node expiry timeout, in seconds.
  --export-interval <secs>       DOT export interval, in seconds.
  --multicast-address <addr>     IPv6 multicast group address.
  --multicast-port <port>        Multicast UDP port.
  --output-file <path>           DOT output file path.
  --http-address <addr>          HTTP listen address (host:port).
  --log-level <level>            Log level (trace|debug|info|warn|error).
  --include-neighbors <bool>     Enable neighbor sharing (true|false).
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_config: Option<String>,
    flag_send_interval: Option<u64>,
    flag_node_timeout: Option<u64>,
    flag_export_interval: Option<u64>,
    flag_multicast_address: Option<String>,
    flag_multicast_port: Option<u16>,
    flag_output_file: Option<String>,
    flag_http_address: Option<String>,
    flag_log_level: Option<String>,
    flag_include_neighbors: Option<String>,
}

/// Loads the config file named by `--config` (if any) and applies CLI
/// overrides on top. Explicit boolean flags override even when false;
/// set-once flags (everything else here) simply overwrite when present.
pub fn load_from_argv(argv: &[String]) -> Result<Config, SettingsError> {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.argv(argv.iter()).deserialize())
        .map_err(SettingsError::from)?;

    let mut config = match &args.flag_config {
        Some(path) => load_file(path)?,
        None => Config::default(),
    };

    if let Some(v) = args.flag_send_interval {
        config.send_interval_secs = v;
    }
    if let Some(v) = args.flag_node_timeout {
        config.node_timeout_secs = v;
    }
    if let Some(v) = args.flag_export_interval {
        config.export_interval_secs = v;
    }
    if let Some(v) = args.flag_multicast_address {
        config.multicast_address = v;
    }
    if let Some(v) = args.flag_multicast_port {
        config.multicast_port = v;
    }
    if let Some(v) = args.flag_output_file {
        config.output_file = v;
    }
    if let Some(v) = args.flag_http_address {
        config.http_address = v;
    }
    if let Some(v) = args.flag_log_level {
        config.log_level = v;
    }
    if let Some(v) = args.flag_include_neighbors {
        config.include_neighbors = v.eq_ignore_ascii_case("true") || v == "1";
    }

    config.validate()?;
    Ok(config)
}

fn load_file(path: &str) -> Result<Config, SettingsError> {
    let contents = fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
}
