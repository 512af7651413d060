// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]

//! bitsect: bounded-memory intersection of large binary integer files.
//!
//! Given two files of little-endian `i32` records, emits every value of B
//! that also appears in A, once, in B's order. Presence is tracked with one
//! bit per possible `i32` (512 MiB in total), so memory never depends on
//! the size of the inputs.
//!
//! # Features
//!
//! - **Segmented bitset**: the 2^32-bit universe split into independently
//!   allocated segments
//! - **Zero-copy scanning**: read buffers are viewed as records in place
//! - **Pluggable read scheduling**: synchronous, asynchronous-but-blocking,
//!   and overlapped double-buffering, all output-identical
//!
//! # Example
//!
//! ```rust,no_run
//! use bitsect::{IntersectCommand, IntersectConfig, Strategy};
//!
//! let config = IntersectConfig::new().with_strategy(Strategy::Overlapped);
//! let stats = IntersectCommand::new(config)
//!     .run("a.bin", "b.bin", "out.bin")
//!     .unwrap();
//! println!("{}", stats);
//! ```

pub mod bitset;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod scanner;
pub mod strategy;

// Re-export commonly used types
pub use bitset::SegmentedBitset;
pub use commands::{IntersectCommand, IntersectStats};
pub use config::IntersectConfig;
pub use error::{IntersectError, Result};
pub use scanner::StreamScanner;
pub use strategy::{BufferSource, Strategy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitset::SegmentedBitset;
    pub use crate::commands::{
        BenchCommand, DumpCommand, GenerateCommand, GenerateConfig, IntersectCommand,
        IntersectStats,
    };
    pub use crate::config::IntersectConfig;
    pub use crate::error::{IntersectError, Result};
    pub use crate::record::{read_values, write_values, Record};
    pub use crate::strategy::{BufferSource, Strategy};
}
