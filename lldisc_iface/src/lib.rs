#![warn(clippy::all)]
#![forbid(unsafe_code)]

//! Real, if modest, implementation of the interface-inventory collaborator
//! spec §1 lists as external: "Interface enumeration / RDMA sysfs probing /
//! WiFi bitrate query (returns a list of `LocalInterface` records)".
//!
//! Follows the shape `althea_kernel_interface` uses for its own system
//! collaborators: a real command-runner behind a trait, parsed with
//! `regex`, so tests can swap in a fixed interface list without touching
//! the network stack.

use std::fs;
use std::net::Ipv6Addr;
use std::path::Path;
use std::process::Command;

use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use lldisc_types::{InterfaceSource, InterfaceSourceError, LocalInterface};
use regex::Regex;

lazy_static! {
    static ref LINK_LOCAL_RE: Regex =
        Regex::new(r"inet6 (fe80::[0-9a-fA-F:]+)/(\d+) scope link").unwrap();
    static ref GLOBAL_INET6_RE: Regex = Regex::new(r"inet6 ([0-9a-fA-F:]+/\d+) scope global").unwrap();
    static ref GLOBAL_INET_RE: Regex = Regex::new(r"inet (\d+\.\d+\.\d+\.\d+/\d+)").unwrap();
}

/// Enumerates interfaces by shelling out to `ip`, the way
/// `althea_kernel_interface::LinuxCommandRunner` shells out to system
/// tools rather than linking against a netlink library directly.
#[derive(Default)]
pub struct LinuxInterfaceSource;

impl InterfaceSource for LinuxInterfaceSource {
    fn get_interfaces(&self) -> Result<Vec<LocalInterface>, InterfaceSourceError> {
        let names = list_interface_names()?;
        let mut result = Vec::new();
        for name in names {
            if name == "lo" {
                continue;
            }
            match build_interface(&name) {
                Ok(Some(iface)) => result.push(iface),
                Ok(None) => {
                    log::trace!("interface {name} has no link-local address, skipping");
                }
                Err(e) => {
                    log::warn!("failed to inspect interface {name}: {e}");
                }
            }
        }
        Ok(result)
    }
}

fn list_interface_names() -> Result<Vec<String>, InterfaceSourceError> {
    let entries = fs::read_dir("/sys/class/net")
        .map_err(|e| InterfaceSourceError(format!("could not list /sys/class/net: {e}")))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| InterfaceSourceError(e.to_string()))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn build_interface(name: &str) -> Result<Option<LocalInterface>, InterfaceSourceError> {
    let output = Command::new("ip")
        .args(["-6", "addr", "show", "dev", name])
        .output()
        .map_err(|e| InterfaceSourceError(format!("could not run `ip addr show`: {e}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    let Some(link_local) = parse_link_local(&stdout) else {
        return Ok(None);
    };

    let mut global_prefixes: Vec<IpNetwork> = parse_captures(&GLOBAL_INET6_RE, &stdout);

    let v4_output = Command::new("ip")
        .args(["-4", "addr", "show", "dev", name])
        .output()
        .map_err(|e| InterfaceSourceError(format!("could not run `ip -4 addr show`: {e}")))?;
    let v4_stdout = String::from_utf8_lossy(&v4_output.stdout);
    global_prefixes.extend(parse_captures(&GLOBAL_INET_RE, &v4_stdout));

    Ok(Some(LocalInterface {
        name: name.to_string(),
        link_local,
        global_prefixes,
        rdma_device: rdma_device_for(name),
        node_guid: rdma_guid_for(name, "node_guid"),
        sys_image_guid: rdma_guid_for(name, "sys_image_guid"),
        speed: link_speed_for(name),
    }))
}

fn parse_link_local(text: &str) -> Option<Ipv6Addr> {
    LINK_LOCAL_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_captures(re: &Regex, text: &str) -> Vec<IpNetwork> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Link speed in Mbit/s, read from sysfs. Per spec §8 boundary cases, a
/// WiFi-only interface reporting speed 0 is a display-time substitution
/// made by segment detection, not here -- this returns the raw value (or
/// `None` when unreadable), unmodified.
fn link_speed_for(name: &str) -> Option<u32> {
    let path = format!("/sys/class/net/{name}/speed");
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&v| v >= 0)
        .map(|v| v as u32)
}

fn rdma_device_for(name: &str) -> Option<String> {
    let candidate = format!("/sys/class/net/{name}/device/infiniband");
    if !Path::new(&candidate).exists() {
        return None;
    }
    fs::read_dir(&candidate)
        .ok()?
        .filter_map(|e| e.ok())
        .find_map(|e| e.file_name().to_str().map(ToString::to_string))
}

fn rdma_guid_for(ifname: &str, which: &str) -> Option<String> {
    let device = rdma_device_for(ifname)?;
    let path = format!("/sys/class/infiniband/{device}/{which}");
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_link_local_address() {
        let sample = "3: eth0: <BROADCAST,MULTICAST,UP> mtu 1500\n    inet6 fe80::21e:67ff:fe0d:1a2b/64 scope link\n       valid_lft forever preferred_lft forever\n";
        assert_eq!(
            parse_link_local(sample),
            Some("fe80::21e:67ff:fe0d:1a2b".parse().unwrap())
        );
    }

    #[test]
    fn parses_global_prefixes() {
        let sample = "inet6 2001:db8::1/64 scope global\n";
        let prefixes = parse_captures(&GLOBAL_INET6_RE, sample);
        assert_eq!(prefixes, vec!["2001:db8::1/64".parse::<IpNetwork>().unwrap()]);
    }

    #[test]
    fn missing_link_local_yields_none() {
        assert_eq!(parse_link_local("inet6 2001:db8::1/64 scope global\n"), None);
    }
}
