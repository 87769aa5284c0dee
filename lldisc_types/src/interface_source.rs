use crate::model::LocalInterface;

/// Errors raised while enumerating local interfaces.
#[derive(Debug)]
pub struct InterfaceSourceError(pub String);

impl std::fmt::Display for InterfaceSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InterfaceSourceError {}

/// The contract the (external) interface-inventory collaborator fulfills:
/// enumerate usable local interfaces on demand. Never cached by callers --
/// re-queried on each sender cycle per spec §5.
pub trait InterfaceSource: Send + Sync {
    fn get_interfaces(&self) -> Result<Vec<LocalInterface>, InterfaceSourceError>;
}
