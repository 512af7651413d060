//! On-disk record format.
//!
//! Input and output files are flat sequences of 4-byte two's-complement
//! integers in little-endian order. No header, no separators, no length
//! prefix. A byte length that is not a multiple of 4 is malformed.
//!
//! [`Record`] has alignment 1, so any byte buffer can be viewed as records
//! in place without copying.

use crate::error::{IntersectError, Result};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use zerocopy::byteorder::little_endian::I32;
use zerocopy::{FromBytes, IntoBytes};

/// A single little-endian `i32` record.
pub type Record = I32;

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = std::mem::size_of::<Record>();

const _: () = assert!(RECORD_SIZE == 4);
const _: () = assert!(std::mem::align_of::<Record>() == 1);

/// View `bytes` as records without copying.
///
/// Fails with [`IntersectError::MalformedInput`] when the length does not
/// split into whole records; a trailing partial record is never dropped.
#[inline]
pub fn as_records(bytes: &[u8]) -> Result<&[Record]> {
    <[Record]>::ref_from_bytes(bytes).map_err(|_| IntersectError::MalformedInput {
        what: "buffer".to_string(),
        len: bytes.len() as u64,
    })
}

/// Encode values as record bytes.
pub fn encode(values: &[i32]) -> Vec<u8> {
    let records: Vec<Record> = values.iter().map(|&v| Record::new(v)).collect();
    records.as_bytes().to_vec()
}

/// Decode record bytes into values.
pub fn decode(bytes: &[u8]) -> Result<Vec<i32>> {
    Ok(as_records(bytes)?.iter().map(|r| r.get()).collect())
}

/// Read a whole record file into memory.
///
/// Meant for small files (tests, verification); the intersect itself
/// streams through [`crate::scanner::StreamScanner`].
pub fn read_values<P: AsRef<Path>>(path: P) -> Result<Vec<i32>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| IntersectError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    decode(&bytes).map_err(|_| IntersectError::MalformedInput {
        what: path.display().to_string(),
        len: bytes.len() as u64,
    })
}

/// Write values as a record file, creating or truncating it.
pub fn write_values<P: AsRef<Path>>(path: P, values: &[i32]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    for &v in values {
        writer.write_all(Record::new(v).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_little_endian_layout() {
        assert_eq!(encode(&[1]), vec![1, 0, 0, 0]);
        assert_eq!(encode(&[-1]), vec![0xff, 0xff, 0xff, 0xff]);
        assert_eq!(encode(&[i32::MIN]), vec![0, 0, 0, 0x80]);
        assert_eq!(encode(&[0x0102_0304]), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_view_is_zero_copy() {
        let bytes = encode(&[7, -7, i32::MAX]);
        let records = as_records(&bytes).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.as_ptr() as *const u8, bytes.as_ptr());
        assert_eq!(records[1].get(), -7);
    }

    #[test]
    fn test_unaligned_view() {
        let mut bytes = vec![0u8];
        bytes.extend(encode(&[5, 6]));
        let records = as_records(&bytes[1..]).unwrap();
        assert_eq!(records[0].get(), 5);
        assert_eq!(records[1].get(), 6);
    }

    #[test]
    fn test_partial_record_rejected() {
        let bytes = [1u8, 0, 0, 0, 9];
        let err = as_records(&bytes).unwrap_err();
        assert!(matches!(err, IntersectError::MalformedInput { len: 5, .. }));
        assert!(as_records(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_file_helpers() {
        let file = NamedTempFile::new().unwrap();
        write_values(file.path(), &[3, -2, 0]).unwrap();
        assert_eq!(read_values(file.path()).unwrap(), vec![3, -2, 0]);

        std::fs::write(file.path(), [0u8; 6]).unwrap();
        let err = read_values(file.path()).unwrap_err();
        assert!(matches!(err, IntersectError::MalformedInput { len: 6, .. }));
    }
}
