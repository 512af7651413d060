//! Intersect two record files into a third.
//!
//! Emits every value of B that also occurs in A, once, in the order it is
//! first met while scanning B.
//!
//! # Failure behavior
//!
//! - Inputs are opened and checked before the output exists, so a missing
//!   or malformed file never creates or truncates the output.
//! - A failure while marking A aborts before the output is created.
//! - A failure while probing B leaves the output holding exactly the
//!   batches flushed so far. Nothing is rolled back.

use crate::bitset::SegmentedBitset;
use crate::config::IntersectConfig;
use crate::domain::DOMAIN_BITS;
use crate::error::{IntersectError, Result};
use crate::output::MatchWriter;
use crate::pipeline::{mark, probe_and_clear};
use crate::scanner::StreamScanner;
use crate::strategy::Strategy;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Intersect command configuration.
#[derive(Debug, Clone, Default)]
pub struct IntersectCommand {
    pub config: IntersectConfig,
}

impl IntersectCommand {
    pub fn new(config: IntersectConfig) -> Self {
        Self { config }
    }

    /// Intersect the files at `a_path` and `b_path`, writing to `out_path`.
    ///
    /// The output is created (or truncated) only after both inputs opened
    /// cleanly and A has been fully marked.
    pub fn run<P, Q, O>(&self, a_path: P, b_path: Q, out_path: O) -> Result<IntersectStats>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        O: AsRef<Path>,
    {
        self.config.validate()?;
        let out_path = out_path.as_ref();
        reject_aliasing(a_path.as_ref(), out_path)?;
        reject_aliasing(b_path.as_ref(), out_path)?;

        let a = StreamScanner::open(a_path)?;
        let b = StreamScanner::open(b_path)?;
        self.execute(a, move || {
            let file = File::create(out_path)?;
            Ok((b, file))
        })
    }

    /// Intersect two arbitrary byte streams into `output`.
    ///
    /// Without file metadata, a partial trailing record is only detected
    /// when the final buffer of its stream is read.
    pub fn run_readers<RA, RB, W>(&self, a: RA, b: RB, output: W) -> Result<IntersectStats>
    where
        RA: Read + Send + 'static,
        RB: Read + Send + 'static,
        W: Write,
    {
        let a = StreamScanner::from_reader(a, "A");
        let b = StreamScanner::from_reader(b, "B");
        self.execute(a, move || Ok((b, output)))
    }

    fn execute<RA, RB, W, F>(&self, a: StreamScanner<RA>, open_probe: F) -> Result<IntersectStats>
    where
        RA: Read + Send + 'static,
        RB: Read + Send + 'static,
        W: Write,
        F: FnOnce() -> Result<(StreamScanner<RB>, W)>,
    {
        self.config.validate()?;
        let strategy = self.config.strategy;
        let buffer_size = self.config.buffer_size;

        let mut bitset = SegmentedBitset::new(DOMAIN_BITS, self.config.segment_bits)?;
        let mut stats = IntersectStats {
            strategy,
            ..Default::default()
        };

        // Phase 1: mark A. The source (and its file) is released before B.
        {
            let mut source = strategy.open(a, buffer_size)?;
            let marked = mark(source.as_mut(), &mut bitset)?;
            stats.a_values = marked.values;
            stats.reads += source.reads();
            stats.stalls += source.stalls();
        }

        // Phase 2: probe B
        let (b, output) = open_probe()?;
        let mut source = strategy.open(b, buffer_size)?;
        let mut writer = MatchWriter::with_capacity(self.config.accumulator_capacity, output);
        let probed = probe_and_clear(source.as_mut(), &mut bitset, &mut writer)?;
        writer.finish()?;

        stats.b_values = probed.values;
        stats.matches = probed.matches;
        stats.flushes = probed.flushes;
        stats.reads += source.reads();
        stats.stalls += source.stalls();

        Ok(stats)
    }
}

/// Refuse to write over an input, which would truncate it mid-read.
fn reject_aliasing(input: &Path, output: &Path) -> Result<()> {
    if !output.exists() {
        return Ok(());
    }
    let (Ok(i), Ok(o)) = (fs::canonicalize(input), fs::canonicalize(output)) else {
        return Ok(());
    };
    if i == o {
        return Err(IntersectError::InvalidArgument(format!(
            "output {} is also an input",
            output.display()
        )));
    }
    Ok(())
}

/// Statistics from an intersect run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectStats {
    pub strategy: Strategy,
    /// Values scanned from A
    pub a_values: u64,
    /// Values scanned from B
    pub b_values: u64,
    /// Distinct values emitted
    pub matches: u64,
    /// Batches written to the output
    pub flushes: u64,
    /// Buffers delivered across both phases
    pub reads: u64,
    /// Waits on reads still in flight (overlapped strategy only)
    pub stalls: u64,
}

impl std::fmt::Display for IntersectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Strategy: {}, A values: {}, B values: {}, Matches: {}, Flushes: {}, Reads: {}, Stalls: {}",
            self.strategy,
            self.a_values,
            self.b_values,
            self.matches,
            self.flushes,
            self.reads,
            self.stalls
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{decode, encode, read_values, write_values};
    use std::io::{self, Cursor};
    use tempfile::tempdir;

    fn run_mem(a: &[i32], b: &[i32], config: IntersectConfig) -> (Vec<i32>, IntersectStats) {
        let mut out = Vec::new();
        let stats = IntersectCommand::new(config)
            .run_readers(Cursor::new(encode(a)), Cursor::new(encode(b)), &mut out)
            .unwrap();
        (decode(&out).unwrap(), stats)
    }

    #[test]
    fn test_scenarios_in_memory() {
        let config = IntersectConfig::default();
        assert_eq!(run_mem(&[1, 2, 3], &[2, 3, 4], config.clone()).0, vec![2, 3]);
        assert_eq!(run_mem(&[5], &[5, 5, 5], config.clone()).0, vec![5]);
        assert!(run_mem(&[], &[1, 2, 3], config.clone()).0.is_empty());
        assert_eq!(
            run_mem(&[-1, 0, i32::MAX], &[-1, i32::MAX, 5], config).0,
            vec![-1, i32::MAX]
        );
    }

    #[test]
    fn test_stats() {
        let config = IntersectConfig::new().with_buffer_size(8);
        let (_, stats) = run_mem(&[1, 2, 3], &[3, 3, 1, 9], config);
        assert_eq!(stats.a_values, 3);
        assert_eq!(stats.b_values, 4);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.reads, 4); // 2 buffers for A, 2 for B
        assert!(stats.to_string().contains("Matches: 2"));
    }

    #[test]
    fn test_invalid_config_rejected_before_io() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.bin");
        let config = IntersectConfig::new().with_buffer_size(6);
        let err = IntersectCommand::new(config)
            .run(dir.path().join("a"), dir.path().join("b"), &out)
            .unwrap_err();
        assert!(matches!(err, IntersectError::InvalidArgument(_)));
        assert!(!out.exists());

        // Tiny segments are refused instead of exhausting memory
        let config = IntersectConfig::new().with_segment_bits(1);
        let err = IntersectCommand::new(config)
            .run(dir.path().join("a"), dir.path().join("b"), &out)
            .unwrap_err();
        assert!(matches!(err, IntersectError::InvalidArgument(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_files_roundtrip() {
        let dir = tempdir().unwrap();
        let (a, b, out) = (
            dir.path().join("a.bin"),
            dir.path().join("b.bin"),
            dir.path().join("out.bin"),
        );
        write_values(&a, &[10, 20, 30]).unwrap();
        write_values(&b, &[30, 40, 10, 30]).unwrap();

        // Stale output content is truncated
        std::fs::write(&out, encode(&[99, 99, 99, 99, 99])).unwrap();

        let stats = IntersectCommand::default().run(&a, &b, &out).unwrap();
        assert_eq!(stats.matches, 2);
        assert_eq!(read_values(&out).unwrap(), vec![30, 10]);
    }

    #[test]
    fn test_output_may_not_alias_input() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        write_values(&a, &[1]).unwrap();
        write_values(&b, &[1]).unwrap();
        let err = IntersectCommand::default().run(&a, &b, &b).unwrap_err();
        assert!(matches!(err, IntersectError::InvalidArgument(_)));
        assert_eq!(read_values(&b).unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_b_does_not_touch_output() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let out = dir.path().join("out.bin");
        write_values(&a, &[1]).unwrap();
        let err = IntersectCommand::default()
            .run(&a, dir.path().join("missing.bin"), &out)
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(!out.exists());
    }
}
