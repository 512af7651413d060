//! Bounded accumulator for matched values.
//!
//! Matches are collected as little-endian records and written out in one
//! `write_all` per flush, straight to the underlying writer with no extra
//! buffering layer. After `k` successful flushes the destination holds
//! exactly those `k` batches, which is what remains on disk if a later read
//! fails.

use crate::error::Result;
use crate::record::Record;
use std::io::Write;
use zerocopy::IntoBytes;

/// Append-only match buffer that flushes to `W` when full.
pub struct MatchWriter<W: Write> {
    writer: W,
    pending: Vec<Record>,
    capacity: usize,
    written: u64,
    flushes: u64,
}

impl<W: Write> MatchWriter<W> {
    /// Create a writer holding at most `capacity` matches between flushes.
    pub fn with_capacity(capacity: usize, writer: W) -> Self {
        let capacity = capacity.max(1);
        Self {
            writer,
            pending: Vec::with_capacity(capacity),
            capacity,
            written: 0,
            flushes: 0,
        }
    }

    /// Append a match, flushing first if it fills the buffer.
    #[inline]
    pub fn push(&mut self, value: i32) -> Result<()> {
        self.pending.push(Record::new(value));
        if self.pending.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Write all buffered matches and clear the buffer. No-op when empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.writer.write_all(self.pending.as_bytes())?;
        self.writer.flush()?;
        self.written += self.pending.len() as u64;
        self.flushes += 1;
        self.pending.clear();
        Ok(())
    }

    /// Matches currently buffered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Matches written out so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Non-empty flushes performed so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{decode, encode};

    #[test]
    fn test_flush_when_full() {
        let mut out = Vec::new();
        {
            let mut writer = MatchWriter::with_capacity(2, &mut out);
            writer.push(1).unwrap();
            assert_eq!(writer.pending(), 1);
            assert_eq!(writer.flushes(), 0);
            writer.push(-2).unwrap();
            assert_eq!(writer.pending(), 0);
            assert_eq!(writer.flushes(), 1);
            writer.push(3).unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(out, encode(&[1, -2, 3]));
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let mut out = Vec::new();
        let mut writer = MatchWriter::with_capacity(4, &mut out);
        writer.flush().unwrap();
        assert_eq!(writer.flushes(), 0);
        assert_eq!(writer.written(), 0);
        writer.finish().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_batches_land_in_order() {
        let mut out = Vec::new();
        let mut writer = MatchWriter::with_capacity(3, &mut out);
        for v in 0..10 {
            writer.push(v).unwrap();
        }
        assert_eq!(writer.flushes(), 3);
        assert_eq!(writer.written(), 9);
        writer.finish().unwrap();
        assert_eq!(decode(&out).unwrap(), (0..10).collect::<Vec<_>>());
    }
}
