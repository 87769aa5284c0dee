use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since epoch, clamped to 0 if the system clock is somehow set
/// before 1970 (spec §3: `Advertisement.timestamp`).
pub fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
