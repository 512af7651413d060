//! Sequential buffered reader over a record file.
//!
//! The scanner owns the read handle, so dropping it releases the file on
//! every exit path, including errors. Each [`StreamScanner::read_next`] call
//! fills the caller's buffer completely unless the stream ends first; a
//! short count therefore only ever happens on the final read.

use crate::error::{IntersectError, Result};
use crate::record::{as_records, Record, RECORD_SIZE};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Streaming reader of 4-byte records.
#[derive(Debug)]
pub struct StreamScanner<R: Read> {
    reader: R,
    name: String,
    bytes_read: u64,
}

impl StreamScanner<File> {
    /// Open a record file for reading.
    ///
    /// The length is checked up front: a file whose size is not a multiple
    /// of 4 fails here with [`IntersectError::MalformedInput`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IntersectError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let meta = file.metadata()?;
        if meta.is_file() && meta.len() % RECORD_SIZE as u64 != 0 {
            return Err(IntersectError::MalformedInput {
                what: path.display().to_string(),
                len: meta.len(),
            });
        }

        Ok(Self {
            reader: file,
            name: path.display().to_string(),
            bytes_read: 0,
        })
    }
}

impl<R: Read> StreamScanner<R> {
    /// Wrap any byte source. No length check is possible up front, so a
    /// partial trailing record surfaces when its buffer is viewed.
    pub fn from_reader(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            bytes_read: 0,
        }
    }

    /// Fill `buf` from the stream. Returns the number of bytes read;
    /// 0 means end of stream.
    pub fn read_next(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.bytes_read += filled as u64;
        Ok(filled)
    }

    /// View the filled prefix of `buf` as records, without copying.
    pub fn as_integers(buf: &[u8], bytes_read: usize) -> Result<&[Record]> {
        let filled = buf.get(..bytes_read).ok_or_else(|| {
            IntersectError::InvalidArgument(format!(
                "{} bytes read into a {} byte buffer",
                bytes_read,
                buf.len()
            ))
        })?;
        as_records(filled)
    }

    /// Like [`Self::as_integers`], naming this stream in the error.
    pub fn view<'b>(&self, buf: &'b [u8], bytes_read: usize) -> Result<&'b [Record]> {
        Self::as_integers(buf, bytes_read).map_err(|e| match e {
            IntersectError::MalformedInput { .. } => IntersectError::MalformedInput {
                what: self.name.clone(),
                len: self.bytes_read,
            },
            other => other,
        })
    }

    /// Name used in error messages (the path for files).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
