//! Command implementations for bitsect.

pub mod bench;
pub mod dump;
pub mod generate;
pub mod intersect;

pub use bench::{files_identical, BenchCommand, BenchRun, BenchStats};
pub use dump::DumpCommand;
pub use generate::{GenerateCommand, GenerateConfig, GenerateStats};
pub use intersect::{IntersectCommand, IntersectStats};
