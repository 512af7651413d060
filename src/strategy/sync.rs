//! Blocking buffer source: every read completes before scanning resumes.

use super::BufferSource;
use crate::error::Result;
use crate::record::Record;
use crate::scanner::StreamScanner;
use std::io::Read;

/// Reads straight into a single buffer on the calling thread.
pub struct SyncSource<R: Read> {
    scanner: StreamScanner<R>,
    buf: Vec<u8>,
    reads: u64,
    finished: bool,
}

impl<R: Read> SyncSource<R> {
    pub fn new(scanner: StreamScanner<R>, buffer_size: usize) -> Self {
        Self {
            scanner,
            buf: vec![0u8; buffer_size],
            reads: 0,
            finished: false,
        }
    }
}

impl<R: Read> BufferSource for SyncSource<R> {
    fn next_buffer(&mut self) -> Result<Option<&[Record]>> {
        if self.finished {
            return Ok(None);
        }

        let n = match self.scanner.read_next(&mut self.buf) {
            Ok(0) => {
                self.finished = true;
                return Ok(None);
            }
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        match self.scanner.view(&self.buf, n) {
            Ok(records) => {
                self.reads += 1;
                Ok(Some(records))
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn reads(&self) -> u64 {
        self.reads
    }
}
