//! Encodes and decodes `Advertisement` to/from the single-datagram textual
//! payload described in spec §6. JSON keeps the "self-contained textual
//! record with named fields" shape without hand-rolling a parser, and
//! tolerates unknown fields for forward compatibility for free.

use crate::error::TypesError;
use crate::model::Advertisement;

/// Soft cap on the encoded payload. Advertisements that would exceed this
/// have their neighbor list truncated until they fit, or until the list is
/// empty -- the required fields are never dropped.
pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024;

/// Encodes an advertisement, truncating its neighbor list if necessary to
/// keep the payload under `MAX_PAYLOAD_BYTES`. Callers are expected to
/// order `neighbors` newest-first (the sender does); truncation drops from
/// the tail, so the newest entries are the ones kept.
pub fn encode(ad: &Advertisement) -> Result<Vec<u8>, TypesError> {
    let mut ad = ad.clone();
    loop {
        let bytes = serde_json::to_vec(&ad)?;
        if bytes.len() <= MAX_PAYLOAD_BYTES {
            return Ok(bytes);
        }
        match &mut ad.neighbors {
            Some(neighbors) if !neighbors.is_empty() => {
                neighbors.pop();
            }
            Some(_) => {
                ad.neighbors = None;
            }
            None => {
                // Nothing left to trim; return the oversized payload as-is
                // rather than silently drop required fields.
                return Ok(bytes);
            }
        }
    }
}

/// Decodes a datagram into an `Advertisement`. Unknown fields are ignored
/// by `serde_json` already; this only rejects structurally invalid JSON or
/// a payload missing `machine_id`.
pub fn decode(bytes: &[u8]) -> Result<Advertisement, TypesError> {
    let ad: Advertisement = serde_json::from_slice(bytes)?;
    if ad.machine_id.as_str().is_empty() {
        return Err(TypesError::MissingMachineId);
    }
    Ok(ad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineId, NeighborRecord, NeighborSide};
    use std::net::Ipv6Addr;

    fn sample_ad() -> Advertisement {
        Advertisement {
            machine_id: MachineId("abc123".into()),
            hostname: "host-a".into(),
            timestamp: 1_700_000_000,
            interface: "eth0".into(),
            source_ip: "fe80::1".parse().unwrap(),
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: Some(1000),
            global_prefixes: vec!["10.0.0.0/24".parse().unwrap()],
            neighbors: None,
        }
    }

    #[test]
    fn round_trips_minimal_advertisement() {
        let ad = sample_ad();
        let bytes = encode(&ad).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(ad, decoded);
    }

    #[test]
    fn rejects_payload_without_machine_id() {
        let bytes = br#"{"hostname":"x","timestamp":1,"interface":"eth0","source_ip":"fe80::1","machine_id":""}"#;
        assert!(matches!(decode(bytes), Err(TypesError::MissingMachineId)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(decode(b"not json").is_err());
    }

    #[test]
    fn tolerates_unknown_fields() {
        let bytes = br#"{"machine_id":"abc","hostname":"h","timestamp":1,"interface":"eth0","source_ip":"fe80::1","totally_unknown_field":42}"#;
        let ad = decode(bytes).unwrap();
        assert_eq!(ad.machine_id.as_str(), "abc");
    }

    #[test]
    fn truncates_neighbor_list_newest_first_when_oversized() {
        let mut ad = sample_ad();
        let side = NeighborSide {
            interface: "eth0".into(),
            address: Ipv6Addr::LOCALHOST,
            rdma_device: None,
            node_guid: None,
            sys_image_guid: None,
            speed: None,
            prefixes: vec![],
        };
        // Build enough neighbors that the naive encoding overflows the cap.
        let mut neighbors = Vec::new();
        for i in 0..500 {
            neighbors.push(NeighborRecord {
                machine_id: MachineId(format!("peer-{i}")),
                hostname: format!("peer-host-{i}-padding-to-make-this-entry-bigger"),
                local: side.clone(),
                remote: side.clone(),
            });
        }
        let newest = neighbors.first().cloned().unwrap();
        ad.neighbors = Some(neighbors);

        let bytes = encode(&ad).unwrap();
        assert!(bytes.len() <= MAX_PAYLOAD_BYTES);
        let decoded = decode(&bytes).unwrap();
        let decoded_neighbors = decoded.neighbors.unwrap_or_default();
        // Truncation drops from the tail (oldest), so the newest entry
        // (first in the newest-first ordering) always survives.
        assert!(decoded_neighbors.len() < 500);
        assert_eq!(decoded_neighbors.first(), Some(&newest));
    }
}
