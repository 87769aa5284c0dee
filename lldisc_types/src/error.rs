use std::error::Error;
use std::fmt;
use std::fmt::Result as FmtResult;

/// Errors produced while building, encoding, or decoding wire types.
#[derive(Debug)]
pub enum TypesError {
    /// The local host could not supply its own machine id.
    NoMachineId(String),
    /// A datagram failed structural parsing.
    MalformedPayload(serde_json::Error),
    /// A decoded payload parsed but had no machine id.
    MissingMachineId,
}

impl fmt::Display for TypesError {
    fn fmt(&self, f: &mut fmt::Formatter) -> FmtResult {
        match self {
            TypesError::NoMachineId(a) => write!(f, "could not determine machine id: {a}"),
            TypesError::MalformedPayload(e) => write!(f, "malformed advertisement payload: {e}"),
            TypesError::MissingMachineId => write!(f, "advertisement payload has no machine_id"),
        }
    }
}

impl Error for TypesError {}

impl From<serde_json::Error> for TypesError {
    fn from(e: serde_json::Error) -> Self {
        TypesError::MalformedPayload(e)
    }
}
