use std::error::Error;
use std::fmt;

/// Configuration errors are fatal at startup (spec §7).
#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
    Invalid(String),
    Docopt(docopt::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(a) => write!(f, "could not read config file: {a}"),
            SettingsError::Parse(a) => write!(f, "could not parse config file: {a}"),
            SettingsError::Invalid(a) => write!(f, "invalid configuration: {a}"),
            SettingsError::Docopt(e) => write!(f, "could not parse command line: {e}"),
        }
    }
}

impl Error for SettingsError {}

impl From<docopt::Error> for SettingsError {
    fn from(e: docopt::Error) -> Self {
        SettingsError::Docopt(e)
    }
}
