//! Error types for the sniffer
//!
//! Only failures that stop frames from arriving at all live here. A frame that
//! cannot be decoded is not an error; see `sniffer_packet::SkipReason`.

use thiserror::Error;

/// Result type alias for sniffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sniffer
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Capture device or file error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// BPF filter could not be compiled or applied
    #[error("Invalid BPF filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// Frame synthesis error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Invalid configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    Config { name: String, reason: String },
}

impl Error {
    /// Create a capture error with a custom message
    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Error::Capture(msg.into())
    }

    /// Create an invalid filter error
    pub fn invalid_filter<S: Into<String>>(filter: S, reason: S) -> Self {
        Error::InvalidFilter {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(name: S, reason: S) -> Self {
        Error::Config {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
