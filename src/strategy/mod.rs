//! Buffer-supply strategies for the intersect phases.
//!
//! The mark and probe phases only ever ask for "the next filled buffer".
//! Each strategy answers that differently:
//! - [`SyncSource`]: plain blocking reads, no overlap
//! - [`SyncOverFutureSource`]: each read runs on the background reader, but
//!   the caller spins until it completes before doing anything else
//! - [`OverlappedSource`]: two alternating buffers; the next read is in
//!   flight while the current buffer is being scanned
//!
//! All three deliver the same records in the same order, so the output of
//! an intersect never depends on the strategy.

pub mod overlapped;
mod reader;
pub mod sync;
pub mod sync_over_future;

pub use overlapped::OverlappedSource;
pub use sync::SyncSource;
pub use sync_over_future::SyncOverFutureSource;

use crate::error::Result;
use crate::record::Record;
use crate::scanner::StreamScanner;
use std::fmt;
use std::io::Read;

/// Supplier of filled record buffers.
pub trait BufferSource {
    /// The next buffer of records, or `None` once the stream is exhausted.
    ///
    /// The returned slice is only valid until the next call.
    fn next_buffer(&mut self) -> Result<Option<&[Record]>>;

    /// Number of non-empty buffers delivered so far.
    fn reads(&self) -> u64;

    /// Times the caller had to wait on a read that was still in flight.
    fn stalls(&self) -> u64 {
        0
    }
}

/// Selects which [`BufferSource`] implementation drives the phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Blocking reads, no overlap
    #[default]
    Sync,
    /// Asynchronous reads awaited immediately
    SyncOverFuture,
    /// Double-buffered reads overlapping with scanning
    Overlapped,
}

impl Strategy {
    /// Every strategy, baseline first.
    pub const ALL: [Strategy; 3] = [Self::Sync, Self::SyncOverFuture, Self::Overlapped];

    /// Parse strategy from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sync" => Some(Self::Sync),
            "sync-over-future" | "sync_over_future" | "blocking" => Some(Self::SyncOverFuture),
            "overlapped" | "async" => Some(Self::Overlapped),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::SyncOverFuture => "sync-over-future",
            Self::Overlapped => "overlapped",
        }
    }

    /// Build the buffer source for this strategy around `scanner`.
    pub fn open<R>(self, scanner: StreamScanner<R>, buffer_size: usize) -> Result<Box<dyn BufferSource>>
    where
        R: Read + Send + 'static,
    {
        Ok(match self {
            Self::Sync => Box::new(SyncSource::new(scanner, buffer_size)),
            Self::SyncOverFuture => Box::new(SyncOverFutureSource::spawn(scanner, buffer_size)?),
            Self::Overlapped => Box::new(OverlappedSource::spawn(scanner, buffer_size)?),
        })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
