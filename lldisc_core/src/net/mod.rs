mod ifindex;
mod receiver;
mod sender;

pub use receiver::{run as run_receiver, ReceiverConfig};
pub use sender::{run as run_sender, SenderConfig};
