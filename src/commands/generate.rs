//! Generate random record files for testing and benchmarking.
//!
//! A holds `a_count` uniform values from `[min, max]`. A share of B
//! (`overlap`) is drawn from A's values, the rest from the same range.
//! Every A value is a pure function of the seed and its position, so B can
//! sample A without holding it in memory and output is reproducible.

use crate::error::{IntersectError, Result};
use crate::record::Record;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use zerocopy::IntoBytes;

/// Buffer size for generated files (1 MB).
const BUF_SIZE: usize = 1024 * 1024;

/// Stream offset separating B's generator from A's.
const B_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Odd multiplier spreading A's element index over the seed bits.
const A_INDEX_MIX: u64 = 0xD1B5_4A32_D192_ED03;

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub a_path: PathBuf,
    pub b_path: PathBuf,
    pub a_count: u64,
    pub b_count: u64,
    pub min: i32,
    pub max: i32,
    /// Fraction of B values sampled from A, in `[0, 1]`
    pub overlap: f64,
    pub seed: u64,
    pub force: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            a_path: PathBuf::from("a.bin"),
            b_path: PathBuf::from("b.bin"),
            a_count: 1_000_000,
            b_count: 1_000_000,
            min: i32::MIN,
            max: i32::MAX,
            overlap: 0.5,
            seed: 42,
            force: false,
        }
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub a_values: u64,
    pub b_values: u64,
    pub b_from_a: u64,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A values: {}, B values: {} ({} sampled from A), Time: {:.2}s",
            self.a_values, self.b_values, self.b_from_a, self.elapsed_secs
        )
    }
}

/// Generate command.
pub struct GenerateCommand {
    config: GenerateConfig,
}

impl GenerateCommand {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Write A and B, concurrently.
    pub fn run(&self) -> Result<GenerateStats> {
        let cfg = &self.config;
        if cfg.min > cfg.max {
            return Err(IntersectError::InvalidArgument(format!(
                "min {} is greater than max {}",
                cfg.min, cfg.max
            )));
        }
        if !(0.0..=1.0).contains(&cfg.overlap) {
            return Err(IntersectError::InvalidArgument(format!(
                "overlap must be within [0, 1], got {}",
                cfg.overlap
            )));
        }
        if cfg.overlap > 0.0 && cfg.a_count == 0 && cfg.b_count > 0 {
            return Err(IntersectError::InvalidArgument(
                "cannot sample B from an empty A".to_string(),
            ));
        }
        if resolve(&cfg.a_path) == resolve(&cfg.b_path) {
            return Err(IntersectError::InvalidArgument(format!(
                "A and B are the same file: {}",
                cfg.a_path.display()
            )));
        }
        if !cfg.force {
            for path in [&cfg.a_path, &cfg.b_path] {
                if path.exists() {
                    return Err(IntersectError::InvalidArgument(format!(
                        "{} exists (use --force to overwrite)",
                        path.display()
                    )));
                }
            }
        }

        let start = Instant::now();
        let (a, b) = rayon::join(|| self.write_a(), || self.write_b());
        a?;
        let b_from_a = b?;

        Ok(GenerateStats {
            a_values: cfg.a_count,
            b_values: cfg.b_count,
            b_from_a,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// The `i`-th value of A.
    #[inline]
    fn a_value(&self, i: u64) -> i32 {
        let mix = i.wrapping_add(1).wrapping_mul(A_INDEX_MIX);
        let mut rng = SmallRng::seed_from_u64(self.config.seed ^ mix);
        rng.gen_range(self.config.min..=self.config.max)
    }

    fn write_a(&self) -> Result<()> {
        let mut writer = create(&self.config.a_path)?;
        for i in 0..self.config.a_count {
            writer.write_all(Record::new(self.a_value(i)).as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_b(&self) -> Result<u64> {
        let cfg = &self.config;
        let mut rng = SmallRng::seed_from_u64(cfg.seed ^ B_STREAM);
        let mut writer = create(&cfg.b_path)?;
        let mut from_a = 0;

        for _ in 0..cfg.b_count {
            let value = if cfg.a_count > 0 && rng.gen_bool(cfg.overlap) {
                from_a += 1;
                self.a_value(rng.gen_range(0..cfg.a_count))
            } else {
                rng.gen_range(cfg.min..=cfg.max)
            };
            writer.write_all(Record::new(value).as_bytes())?;
        }
        writer.flush()?;
        Ok(from_a)
    }
}

/// Absolute form of `path`, resolving the parent when the file does not
/// exist yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(full) = fs::canonicalize(path) {
        return full;
    }
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    fs::canonicalize(dir)
        .map(|d| d.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| IntersectError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::with_capacity(BUF_SIZE, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::read_values;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> GenerateConfig {
        GenerateConfig {
            a_path: dir.join("a.bin"),
            b_path: dir.join("b.bin"),
            a_count: 500,
            b_count: 800,
            min: -1000,
            max: 1000,
            overlap: 0.25,
            seed: 7,
            force: false,
        }
    }

    #[test]
    fn test_counts_and_range() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        let stats = GenerateCommand::new(cfg.clone()).run().unwrap();

        let a = read_values(&cfg.a_path).unwrap();
        let b = read_values(&cfg.b_path).unwrap();
        assert_eq!(a.len(), 500);
        assert_eq!(b.len(), 800);
        assert!(a.iter().chain(&b).all(|v| (-1000..=1000).contains(v)));
        assert_eq!(stats.b_values, 800);
        assert!(stats.b_from_a > 100 && stats.b_from_a < 300);
    }

    #[test]
    fn test_full_overlap_draws_only_from_a() {
        let dir = tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.min = i32::MIN;
        cfg.max = i32::MAX;
        cfg.overlap = 1.0;
        GenerateCommand::new(cfg.clone()).run().unwrap();

        let a: HashSet<i32> = read_values(&cfg.a_path).unwrap().into_iter().collect();
        let b = read_values(&cfg.b_path).unwrap();
        assert!(b.iter().all(|v| a.contains(v)));
    }

    #[test]
    fn test_deterministic() {
        let dir = tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        GenerateCommand::new(cfg.clone()).run().unwrap();
        let first = (read_values(&cfg.a_path).unwrap(), read_values(&cfg.b_path).unwrap());

        cfg.force = true;
        GenerateCommand::new(cfg.clone()).run().unwrap();
        let second = (read_values(&cfg.a_path).unwrap(), read_values(&cfg.b_path).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::write(&cfg.a_path, b"").unwrap();
        let err = GenerateCommand::new(cfg).run().unwrap_err();
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_rejects_same_path_for_a_and_b() {
        let dir = tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.b_path = dir.path().join(".").join("a.bin");
        let err = GenerateCommand::new(cfg.clone()).run().unwrap_err();
        assert!(matches!(err, IntersectError::InvalidArgument(_)));
        assert!(!cfg.a_path.exists());

        // Also when the file already exists and would be overwritten
        std::fs::write(&cfg.a_path, b"").unwrap();
        cfg.force = true;
        assert!(GenerateCommand::new(cfg.clone()).run().is_err());
        assert_eq!(std::fs::metadata(&cfg.a_path).unwrap().len(), 0);
    }

    #[test]
    fn test_neighbouring_seeds_are_unrelated() {
        let dir = tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.min = i32::MIN;
        cfg.max = i32::MAX;
        GenerateCommand::new(cfg.clone()).run().unwrap();
        let first = read_values(&cfg.a_path).unwrap();

        cfg.seed += 1;
        cfg.force = true;
        GenerateCommand::new(cfg.clone()).run().unwrap();
        let second = read_values(&cfg.a_path).unwrap();

        assert_ne!(first[1..], second[..second.len() - 1]);
        assert_ne!(first[..first.len() - 1], second[1..]);
        let shared = first.iter().filter(|v| second.contains(v)).count();
        assert!(shared < 5, "{} values shared", shared);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let dir = tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.min = 5;
        cfg.max = 4;
        assert!(GenerateCommand::new(cfg.clone()).run().is_err());

        cfg.min = 0;
        cfg.overlap = 1.5;
        assert!(GenerateCommand::new(cfg).run().is_err());
    }
}
