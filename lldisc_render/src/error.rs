use std::error::Error;
use std::fmt;
use std::io;

/// Errors from rendering or exporting a snapshot. Rendering itself never
/// fails (it is a pure function over already-validated in-memory data);
/// only the atomic write can (spec §7: "File write on export -- log at
/// error, leave change flag raised so the next export re-attempts").
#[derive(Debug)]
pub enum RenderError {
    Io(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "export write failed: {e}"),
        }
    }
}

impl Error for RenderError {}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}
