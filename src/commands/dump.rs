//! Print a record file as text, one value per line.

use crate::error::{IntersectError, Result};
use crate::record::{as_records, Record, RECORD_SIZE};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Dump command configuration.
#[derive(Debug, Clone, Default)]
pub struct DumpCommand {
    /// Stop after this many values
    pub limit: Option<u64>,
}

impl DumpCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the values of the file at `path` to `output`. Returns the
    /// number of values written.
    pub fn run<P: AsRef<Path>, W: Write>(&self, path: P, output: &mut W) -> Result<u64> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IntersectError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let len = file.metadata()?.len();
        if len % RECORD_SIZE as u64 != 0 {
            return Err(IntersectError::MalformedInput {
                what: path.display().to_string(),
                len,
            });
        }
        // Zero-length files cannot be mapped on every platform
        if len == 0 {
            return Ok(0);
        }

        // SAFETY: the map is read-only and dropped before returning; a
        // concurrent writer truncating the file is outside our contract.
        let mmap = unsafe { Mmap::map(&file)? };
        let records = as_records(&mmap)?;
        self.write_records(records, output)
    }

    fn write_records<W: Write>(&self, records: &[Record], output: &mut W) -> Result<u64> {
        let take = match self.limit {
            Some(n) => records.len().min(usize::try_from(n).unwrap_or(usize::MAX)),
            None => records.len(),
        };

        let mut writer = BufWriter::with_capacity(256 * 1024, output);
        let mut itoa_buf = itoa::Buffer::new();
        for record in &records[..take] {
            writer.write_all(itoa_buf.format(record.get()).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(take as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::write_values;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dump_values() {
        let file = NamedTempFile::new().unwrap();
        write_values(file.path(), &[1, -2, i32::MIN, i32::MAX]).unwrap();

        let mut out = Vec::new();
        let n = DumpCommand::new().run(file.path(), &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1\n-2\n-2147483648\n2147483647\n"
        );
    }

    #[test]
    fn test_dump_limit() {
        let file = NamedTempFile::new().unwrap();
        write_values(file.path(), &[1, 2, 3]).unwrap();

        let mut out = Vec::new();
        let cmd = DumpCommand { limit: Some(2) };
        assert_eq!(cmd.run(file.path(), &mut out).unwrap(), 2);
        assert_eq!(out, b"1\n2\n");
    }

    #[test]
    fn test_dump_empty_and_malformed() {
        let file = NamedTempFile::new().unwrap();
        let mut out = Vec::new();
        assert_eq!(DumpCommand::new().run(file.path(), &mut out).unwrap(), 0);

        std::fs::write(file.path(), [0u8; 7]).unwrap();
        let err = DumpCommand::new().run(file.path(), &mut out).unwrap_err();
        assert!(matches!(err, IntersectError::MalformedInput { len: 7, .. }));
    }
}
