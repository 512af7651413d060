//! Run every strategy on the same inputs and compare.
//!
//! Each strategy writes its own output file (`<stem>.<strategy>.bin` in the
//! output directory). The `sync` output is the baseline; any other output
//! that differs from it by a single byte fails the run.

use super::intersect::{IntersectCommand, IntersectStats};
use crate::config::IntersectConfig;
use crate::error::{IntersectError, Result};
use crate::strategy::Strategy;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One strategy's run.
#[derive(Debug, Clone)]
pub struct BenchRun {
    pub strategy: Strategy,
    pub elapsed: Duration,
    pub output: PathBuf,
    pub stats: IntersectStats,
}

/// Results of a bench, baseline first.
#[derive(Debug, Clone, Default)]
pub struct BenchStats {
    pub runs: Vec<BenchRun>,
}

impl std::fmt::Display for BenchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{:<17} {:>10.3}s  matches: {}, reads: {}, stalls: {}",
                run.strategy.name(),
                run.elapsed.as_secs_f64(),
                run.stats.matches,
                run.stats.reads,
                run.stats.stalls
            )?;
        }
        Ok(())
    }
}

/// Bench command configuration.
#[derive(Debug, Clone, Default)]
pub struct BenchCommand {
    /// Shared settings; the strategy field is overridden per run
    pub config: IntersectConfig,
    /// Strategies to run. Empty means all of them.
    pub strategies: Vec<Strategy>,
}

impl BenchCommand {
    pub fn new(config: IntersectConfig) -> Self {
        Self {
            config,
            strategies: Vec::new(),
        }
    }

    pub fn run<P: AsRef<Path>, Q: AsRef<Path>, D: AsRef<Path>>(
        &self,
        a_path: P,
        b_path: Q,
        out_dir: D,
    ) -> Result<BenchStats> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;
        let stem = b_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());

        // Baseline always runs, and runs first
        let mut strategies = vec![Strategy::Sync];
        let requested: &[Strategy] = if self.strategies.is_empty() {
            &Strategy::ALL
        } else {
            &self.strategies
        };
        strategies.extend(requested.iter().copied().filter(|s| *s != Strategy::Sync));

        let mut stats = BenchStats::default();
        for strategy in strategies {
            let output = out_dir.join(format!("{}.{}.bin", stem, strategy.name()));
            let cmd = IntersectCommand::new(self.config.clone().with_strategy(strategy));

            let start = Instant::now();
            let run_stats = cmd.run(a_path.as_ref(), b_path.as_ref(), &output)?;
            let elapsed = start.elapsed();

            if let Some(baseline) = stats.runs.first() {
                if !files_identical(&baseline.output, &output)? {
                    return Err(IntersectError::OutputMismatch {
                        strategy: strategy.name().to_string(),
                        baseline: baseline.strategy.name().to_string(),
                    });
                }
            }

            stats.runs.push(BenchRun {
                strategy,
                elapsed,
                output,
                stats: run_stats,
            });
        }

        Ok(stats)
    }
}

/// Compare two files byte for byte.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let (fa, fb) = (File::open(a)?, File::open(b)?);
    if fa.metadata()?.len() != fb.metadata()?.len() {
        return Ok(false);
    }

    let mut ra = BufReader::new(fa);
    let mut rb = BufReader::new(fb);
    let mut buf_a = vec![0u8; 64 * 1024];
    let mut buf_b = vec![0u8; 64 * 1024];
    loop {
        let n = read_full(&mut ra, &mut buf_a)?;
        let m = read_full(&mut rb, &mut buf_b)?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
