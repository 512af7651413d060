//! Double-buffered reads overlapping with scanning.
//!
//! Two buffers alternate. When the caller asks for the next buffer, the
//! read for it is normally already in flight; once it completes, the read
//! into the other buffer (the one the caller just finished scanning) is
//! issued before the fresh data is handed out. The caller therefore only
//! waits when scanning outpaces the disk.
//!
//! Reads are issued and completed in order on a single reader thread, so
//! records arrive exactly as the synchronous source delivers them.

use super::reader::{BackgroundReader, PendingRead};
use super::BufferSource;
use crate::error::Result;
use crate::record::{as_records, Record};
use crate::scanner::StreamScanner;
use std::io::Read;

pub struct OverlappedSource {
    reader: BackgroundReader,
    /// Read in flight for the buffer the caller will consume next.
    in_flight: Option<PendingRead>,
    /// Buffer currently handed to the caller.
    current: Vec<u8>,
    len: usize,
    buffer_size: usize,
    reads: u64,
    stalls: u64,
    finished: bool,
}

impl OverlappedSource {
    pub fn spawn<R>(scanner: StreamScanner<R>, buffer_size: usize) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        Ok(Self {
            reader: BackgroundReader::spawn(scanner)?,
            in_flight: None,
            current: vec![0u8; buffer_size],
            len: 0,
            buffer_size,
            reads: 0,
            stalls: 0,
            finished: false,
        })
    }

    fn fail<T>(&mut self, e: crate::error::IntersectError) -> Result<T> {
        self.finished = true;
        self.in_flight = None;
        Err(e)
    }
}

impl BufferSource for OverlappedSource {
    fn next_buffer(&mut self) -> Result<Option<&[Record]>> {
        if self.finished {
            return Ok(None);
        }

        // Only the very first call has nothing in flight yet
        let pending = match self.in_flight.take() {
            Some(pending) => pending,
            None => match self.reader.issue(vec![0u8; self.buffer_size]) {
                Ok(pending) => pending,
                Err(e) => return self.fail(e),
            },
        };

        if !pending.is_complete() {
            self.stalls += 1;
        }
        let done = match pending.wait() {
            Ok(done) => done,
            Err(e) => return self.fail(e),
        };

        let n = match done.result {
            Ok(0) => {
                self.finished = true;
                return Ok(None);
            }
            Ok(n) => n,
            Err(e) => return self.fail(e),
        };

        // Swap in the fresh buffer and refill the one the caller is done with
        let consumed = std::mem::replace(&mut self.current, done.buf);
        self.len = n;
        match self.reader.issue(consumed) {
            Ok(pending) => self.in_flight = Some(pending),
            Err(e) => return self.fail(e),
        }

        self.reads += 1;
        as_records(&self.current[..self.len]).map(Some)
    }

    fn reads(&self) -> u64 {
        self.reads
    }

    fn stalls(&self) -> u64 {
        self.stalls
    }
}
