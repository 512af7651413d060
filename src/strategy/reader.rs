//! Background reader shared by the future-based strategies.
//!
//! A dedicated thread owns the scanner and fills whatever buffer it is
//! handed, in request order. Issuing a read returns a [`PendingRead`] that
//! completes when the thread sends the buffer back. At most one read is in
//! flight per source, so the completion channel never holds more than one
//! message and completions cannot be confused.
//!
//! Dropping the reader closes the request channel and joins the thread,
//! which releases the file handle.

use crate::error::{IntersectError, Result};
use crate::scanner::StreamScanner;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io::Read;
use std::thread::{self, JoinHandle};

/// Spins before yielding while busy-waiting on a read.
const SPINS_BEFORE_YIELD: u32 = 1024;

/// A buffer returned by the reader thread with the outcome of its read.
pub(crate) struct Completion {
    pub buf: Vec<u8>,
    /// Bytes read, already validated to be whole records.
    pub result: Result<usize>,
}

pub(crate) struct BackgroundReader {
    requests: Option<Sender<Vec<u8>>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundReader {
    pub fn spawn<R>(scanner: StreamScanner<R>) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<Vec<u8>>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<Completion>();

        let handle = thread::Builder::new()
            .name(format!("bitsect-reader:{}", scanner.name()))
            .spawn(move || {
                let mut scanner = scanner;
                for mut buf in request_rx.iter() {
                    let result = scanner
                        .read_next(&mut buf)
                        .and_then(|n| scanner.view(&buf, n).map(|_| n));
                    let failed = result.is_err();
                    if done_tx.send(Completion { buf, result }).is_err() || failed {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(request_tx),
            completions: done_rx,
            handle: Some(handle),
        })
    }

    /// Start filling `buf` on the reader thread.
    pub fn issue(&self, buf: Vec<u8>) -> Result<PendingRead> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(IntersectError::ReaderDisconnected)?;
        requests
            .send(buf)
            .map_err(|_| IntersectError::ReaderDisconnected)?;
        Ok(PendingRead {
            completions: self.completions.clone(),
        })
    }
}

impl Drop for BackgroundReader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Handle to a read in flight on the reader thread.
#[must_use = "a pending read holds one of the source's buffers"]
pub(crate) struct PendingRead {
    completions: Receiver<Completion>,
}

impl PendingRead {
    /// Whether the read has completed.
    pub fn is_complete(&self) -> bool {
        !self.completions.is_empty()
    }

    /// Block until the read completes.
    pub fn wait(self) -> Result<Completion> {
        self.completions
            .recv()
            .map_err(|_| IntersectError::ReaderDisconnected)
    }

    /// Poll until the read completes, without parking the thread.
    pub fn spin_wait(self) -> Result<Completion> {
        let mut spins = 0u32;
        loop {
            match self.completions.try_recv() {
                Ok(done) => return Ok(done),
                Err(TryRecvError::Empty) => {
                    spins += 1;
                    if spins % SPINS_BEFORE_YIELD == 0 {
                        thread::yield_now();
                    } else {
                        std::hint::spin_loop();
                    }
                }
                Err(TryRecvError::Disconnected) => return Err(IntersectError::ReaderDisconnected),
            }
        }
    }
}
