//! Asynchronous reads awaited by busy-waiting.
//!
//! Every read is handed to the background reader, and the caller then spins
//! on it until it completes. Nothing runs while the read is in flight, so
//! this pays the cost of the asynchronous machinery with none of the
//! overlap. It serves as the comparison point against [`super::OverlappedSource`].

use super::reader::BackgroundReader;
use super::BufferSource;
use crate::error::Result;
use crate::record::{as_records, Record};
use crate::scanner::StreamScanner;
use std::io::Read;

pub struct SyncOverFutureSource {
    reader: BackgroundReader,
    /// `None` only while a read is in flight or after a failed one.
    buf: Option<Vec<u8>>,
    len: usize,
    reads: u64,
    finished: bool,
}

impl SyncOverFutureSource {
    pub fn spawn<R>(scanner: StreamScanner<R>, buffer_size: usize) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        Ok(Self {
            reader: BackgroundReader::spawn(scanner)?,
            buf: Some(vec![0u8; buffer_size]),
            len: 0,
            reads: 0,
            finished: false,
        })
    }
}

impl BufferSource for SyncOverFutureSource {
    fn next_buffer(&mut self) -> Result<Option<&[Record]>> {
        if self.finished {
            return Ok(None);
        }
        let Some(buf) = self.buf.take() else {
            self.finished = true;
            return Ok(None);
        };

        // Issue, then immediately spin until done
        let done = match self.reader.issue(buf).and_then(|pending| pending.spin_wait()) {
            Ok(done) => done,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.buf = Some(done.buf);

        self.len = match done.result {
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
        self.reads += 1;

        match &self.buf {
            Some(buf) => as_records(&buf[..self.len]).map(Some),
            None => Ok(None),
        }
    }

    fn reads(&self) -> u64 {
        self.reads
    }
}
