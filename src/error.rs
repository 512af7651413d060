//! Error type shared by every stage of the intersect.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning inputs or writing matches.
#[derive(Error, Debug)]
pub enum IntersectError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A byte count that does not split into whole 4-byte records.
    #[error("Malformed input: {what} has {len} bytes, not a multiple of 4")]
    MalformedInput { what: String, len: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Bitset index outside the domain. The domain mapping never produces
    /// one, so seeing this means the mapping is broken, not the input.
    #[error("Index {index} out of range for bitset of {domain_bits} bits")]
    IndexOutOfRange { index: u64, domain_bits: u64 },

    #[error("Background reader disconnected before completing a read")]
    ReaderDisconnected,

    #[error("Output of strategy {strategy} differs from {baseline}")]
    OutputMismatch { strategy: String, baseline: String },
}

impl IntersectError {
    /// The underlying `io::ErrorKind`, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(e) | Self::Open { source: e, .. } => Some(e.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IntersectError>;
