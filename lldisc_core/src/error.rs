use std::error::Error;
use std::fmt;
use std::io;

use lldisc_types::{InterfaceSourceError, TypesError};

/// Errors that can surface from the topology engine. None of these are
/// fatal at runtime (spec §7: "Nothing in the steady-state path can kill
/// the daemon; only cancellation does.") -- callers log and continue.
#[derive(Debug)]
pub enum CoreError {
    Codec(TypesError),
    InterfaceSource(InterfaceSourceError),
    Io(io::Error),
    Socket(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Codec(e) => write!(f, "{e}"),
            CoreError::InterfaceSource(e) => write!(f, "{e}"),
            CoreError::Io(e) => write!(f, "{e}"),
            CoreError::Socket(a) => write!(f, "socket error: {a}"),
        }
    }
}

impl Error for CoreError {}

impl From<TypesError> for CoreError {
    fn from(e: TypesError) -> Self {
        CoreError::Codec(e)
    }
}

impl From<InterfaceSourceError> for CoreError {
    fn from(e: InterfaceSourceError) -> Self {
        CoreError::InterfaceSource(e)
    }
}

impl From<io::Error> for CoreError {
    fn from(e: io::Error) -> Self {
        CoreError::Io(e)
    }
}
