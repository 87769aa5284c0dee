//! Interface-name to kernel ifindex resolution, shared by the sender (to
//! pick the egress zone for a link-local socket) and the receiver (to join
//! the multicast group on a specific interface).

use nix::net::if_::if_nametoindex;

use crate::error::CoreError;

pub fn ifindex_for(name: &str) -> Result<u32, CoreError> {
    if_nametoindex(name).map_err(|errno| {
        CoreError::Socket(format!("if_nametoindex({name}) failed: {errno}"))
    })
}
