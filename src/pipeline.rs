//! The two intersect phases.
//!
//! # Algorithm
//!
//! 1. **Mark**: scan A, setting the bit of every value seen.
//! 2. **Probe and clear**: scan B; for each value whose bit is set, emit it
//!    and clear the bit.
//!
//! During the probe a set bit means "seen in A and not yet emitted", so each
//! distinct value is emitted once, at its first position in B, however often
//! it repeats. Output follows B's scan order.
//!
//! Both phases are written against [`BufferSource`], so the scheduling of
//! reads is entirely up to the strategy driving them. Mark always runs to
//! completion before the probe starts.
//!
//! # Memory
//!
//! Work is O(|A| + |B|). Memory is the bitset plus the read buffers plus the
//! accumulator, independent of file sizes.

use crate::bitset::SegmentedBitset;
use crate::domain::to_index;
use crate::error::Result;
use crate::output::MatchWriter;
use crate::strategy::BufferSource;
use std::io::Write;

/// Counters from the mark phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkStats {
    pub values: u64,
    pub buffers: u64,
}

/// Counters from the probe phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    pub values: u64,
    pub buffers: u64,
    pub matches: u64,
    pub flushes: u64,
}

/// Record every value from `source` in `bitset`.
pub fn mark(source: &mut dyn BufferSource, bitset: &mut SegmentedBitset) -> Result<MarkStats> {
    let mut stats = MarkStats::default();

    while let Some(records) = source.next_buffer()? {
        stats.buffers += 1;
        stats.values += records.len() as u64;
        for record in records {
            bitset.set(to_index(record.get()), true)?;
        }
    }

    Ok(stats)
}

/// Emit each value from `source` whose bit is set, clearing it on the way.
///
/// Remaining matches are flushed when the source is exhausted. On error,
/// whatever was flushed before stays written.
pub fn probe_and_clear<W: Write>(
    source: &mut dyn BufferSource,
    bitset: &mut SegmentedBitset,
    output: &mut MatchWriter<W>,
) -> Result<ProbeStats> {
    let mut stats = ProbeStats::default();

    while let Some(records) = source.next_buffer()? {
        stats.buffers += 1;
        stats.values += records.len() as u64;
        for record in records {
            let value = record.get();
            if bitset.take(to_index(value))? {
                stats.matches += 1;
                output.push(value)?;
            }
        }
    }

    output.flush()?;
    stats.flushes = output.flushes();
    Ok(stats)
}
