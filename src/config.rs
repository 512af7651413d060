//! Run configuration for an intersect.
//!
//! Everything tunable is carried by an [`IntersectConfig`] that the caller
//! builds and hands to [`crate::commands::IntersectCommand`]. There is no
//! process-wide state, so concurrent runs with different settings never
//! interfere.

use crate::bitset::MAX_SEGMENTS;
use crate::domain::DOMAIN_BITS;
use crate::error::{IntersectError, Result};
use crate::record::RECORD_SIZE;
use crate::strategy::Strategy;

/// Default read buffer size (4 KB).
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default bitset segment size (2^26 bits, 8 MiB per segment).
pub const DEFAULT_SEGMENT_BITS: u64 = 1 << 26;

/// Smallest accepted segment size (4096 bits). Smaller segments would need
/// more than [`MAX_SEGMENTS`] allocations to cover the domain.
pub const MIN_SEGMENT_BITS: u64 = DOMAIN_BITS / MAX_SEGMENTS;

/// Default number of matches held before a flush.
pub const DEFAULT_ACCUMULATOR_CAPACITY: usize = 4096;

/// Settings for a single intersect run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectConfig {
    /// Bytes per read; must be a positive multiple of 4
    pub buffer_size: usize,
    /// Bits per bitset segment, at least [`MIN_SEGMENT_BITS`]. Affects
    /// locality and allocation count only, never output.
    pub segment_bits: u64,
    /// Matches buffered before they are written out
    pub accumulator_capacity: usize,
    /// How reads are scheduled relative to scanning
    pub strategy: Strategy,
}

impl Default for IntersectConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            segment_bits: DEFAULT_SEGMENT_BITS,
            accumulator_capacity: DEFAULT_ACCUMULATOR_CAPACITY,
            strategy: Strategy::Sync,
        }
    }
}

impl IntersectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_segment_bits(mut self, segment_bits: u64) -> Self {
        self.segment_bits = segment_bits;
        self
    }

    pub fn with_accumulator_capacity(mut self, capacity: usize) -> Self {
        self.accumulator_capacity = capacity;
        self
    }

    /// Check the settings before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || self.buffer_size % RECORD_SIZE != 0 {
            return Err(IntersectError::InvalidArgument(format!(
                "buffer size must be a positive multiple of {} bytes, got {}",
                RECORD_SIZE, self.buffer_size
            )));
        }
        if self.segment_bits < MIN_SEGMENT_BITS {
            return Err(IntersectError::InvalidArgument(format!(
                "segment size must be at least {} bits, got {}",
                MIN_SEGMENT_BITS, self.segment_bits
            )));
        }
        if self.accumulator_capacity == 0 {
            return Err(IntersectError::InvalidArgument(
                "accumulator capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
