//! The crate-wide error type.

use std::{error::Error, fmt::Display, io};

/// Everything that can stop the bridge. Config and socket problems happen at
/// startup; once the polling loop is up only [`BridgeError::FatalLink`] ends
/// it.
#[derive(Debug)]
pub enum BridgeError {
    /// Reading a file or binding a socket failed
    IOError(io::Error),
    /// The config file is not valid RON for [`crate::config::Config`]
    ConfigError(ron::error::SpannedError),
    /// The serial device can never be opened with these settings
    FatalLink(io::Error),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::IOError(e) => write!(f, "I/O error: {e}"),
            BridgeError::ConfigError(e) => write!(f, "invalid config: {e}"),
            BridgeError::FatalLink(e) => write!(f, "cannot open serial link: {e}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::IOError(e) | BridgeError::FatalLink(e) => Some(e),
            BridgeError::ConfigError(e) => Some(e),
        }
    }
}

impl From<io::Error> for BridgeError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<ron::error::SpannedError> for BridgeError {
    fn from(value: ron::error::SpannedError) -> Self {
        Self::ConfigError(value)
    }
}
