//! Segmented bitset over a fixed universe of indices.
//!
//! One bit per index in `[0, domain_bits)`, stored as independently allocated
//! segments of `segment_bits` bits each (the last one possibly shorter). Index
//! `i` lives in segment `i / segment_bits` at offset `i % segment_bits`.
//!
//! Segmenting caps the size of any single allocation; a full 2^32 domain
//! needs 512 MiB in total as long as segments span many words. Each segment
//! is rounded up to whole `u64` words and boxed on its own, so tiny segments
//! multiply memory; at most [`MAX_SEGMENTS`] are allowed. Segments are
//! zero-initialized through `vec![0; n]`, so untouched pages are never
//! committed by the allocator.

use crate::error::{IntersectError, Result};

const WORD_BITS: u64 = u64::BITS as u64;

/// Upper bound on the number of segments in one bitset.
pub const MAX_SEGMENTS: u64 = 1 << 20;

/// Fixed-universe membership bitset split into segments.
#[derive(Debug)]
pub struct SegmentedBitset {
    segments: Vec<Box<[u64]>>,
    domain_bits: u64,
    segment_bits: u64,
}

impl SegmentedBitset {
    /// Allocate a bitset covering `domain_bits` indices, all initially false.
    pub fn new(domain_bits: u64, segment_bits: u64) -> Result<Self> {
        if domain_bits == 0 {
            return Err(IntersectError::InvalidArgument(
                "bitset domain must be at least 1 bit".to_string(),
            ));
        }
        if segment_bits == 0 {
            return Err(IntersectError::InvalidArgument(
                "bitset segment size must be at least 1 bit".to_string(),
            ));
        }

        let full = domain_bits / segment_bits;
        let rem = domain_bits % segment_bits;
        let count = full + u64::from(rem != 0);
        if count > MAX_SEGMENTS {
            return Err(IntersectError::InvalidArgument(format!(
                "{} segments of {} bits exceed the limit of {}",
                count, segment_bits, MAX_SEGMENTS
            )));
        }

        let words_per_segment = usize::try_from(segment_bits.div_ceil(WORD_BITS))
            .map_err(|_| IntersectError::InvalidArgument("segment too large".to_string()))?;

        let mut segments = Vec::with_capacity(count as usize);
        for _ in 0..full {
            segments.push(vec![0u64; words_per_segment].into_boxed_slice());
        }
        if rem != 0 {
            segments.push(vec![0u64; rem.div_ceil(WORD_BITS) as usize].into_boxed_slice());
        }

        Ok(Self {
            segments,
            domain_bits,
            segment_bits,
        })
    }

    /// Number of addressable indices.
    #[inline]
    pub fn domain_bits(&self) -> u64 {
        self.domain_bits
    }

    #[inline]
    pub fn segment_bits(&self) -> u64 {
        self.segment_bits
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of bits held by segment `i`; only the last may be short.
    pub fn segment_len(&self, i: usize) -> Option<u64> {
        let count = self.segments.len();
        if i >= count {
            return None;
        }
        if i + 1 < count {
            Some(self.segment_bits)
        } else {
            Some(self.domain_bits - (count as u64 - 1) * self.segment_bits)
        }
    }

    /// Read the bit at `index`.
    #[inline]
    pub fn get(&self, index: u64) -> Result<bool> {
        let (segment, word, mask) = self.locate(index)?;
        Ok(self.segments[segment][word] & mask != 0)
    }

    /// Write the bit at `index`.
    #[inline]
    pub fn set(&mut self, index: u64, value: bool) -> Result<()> {
        let (segment, word, mask) = self.locate(index)?;
        let w = &mut self.segments[segment][word];
        if value {
            *w |= mask;
        } else {
            *w &= !mask;
        }
        Ok(())
    }

    /// Clear the bit at `index`, returning whether it was set.
    #[inline]
    pub fn take(&mut self, index: u64) -> Result<bool> {
        let (segment, word, mask) = self.locate(index)?;
        let w = &mut self.segments[segment][word];
        let was_set = *w & mask != 0;
        *w &= !mask;
        Ok(was_set)
    }

    /// Count set bits across all segments.
    pub fn count_ones(&self) -> u64 {
        self.segments
            .iter()
            .flat_map(|s| s.iter())
            .map(|w| u64::from(w.count_ones()))
            .sum()
    }

    #[inline]
    fn locate(&self, index: u64) -> Result<(usize, usize, u64)> {
        if index >= self.domain_bits {
            return Err(IntersectError::IndexOutOfRange {
                index,
                domain_bits: self.domain_bits,
            });
        }
        let segment = (index / self.segment_bits) as usize;
        let offset = index % self.segment_bits;
        Ok((
            segment,
            (offset / WORD_BITS) as usize,
            1u64 << (offset % WORD_BITS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{to_index, DOMAIN_BITS};

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(matches!(
            SegmentedBitset::new(0, 64),
            Err(IntersectError::InvalidArgument(_))
        ));
        assert!(matches!(
            SegmentedBitset::new(64, 0),
            Err(IntersectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_too_many_segments() {
        // One-bit segments over the full domain would be 2^32 allocations
        assert!(matches!(
            SegmentedBitset::new(DOMAIN_BITS, 1),
            Err(IntersectError::InvalidArgument(_))
        ));
        let bits = SegmentedBitset::new(MAX_SEGMENTS * 64, 64).unwrap();
        assert_eq!(bits.segment_count() as u64, MAX_SEGMENTS);
        assert!(SegmentedBitset::new(MAX_SEGMENTS * 64 + 1, 64).is_err());
    }

    #[test]
    fn test_segment_layout() {
        let bits = SegmentedBitset::new(1000, 300).unwrap();
        assert_eq!(bits.segment_count(), 4);
        assert_eq!(bits.segment_len(0), Some(300));
        assert_eq!(bits.segment_len(2), Some(300));
        assert_eq!(bits.segment_len(3), Some(100)); // truncated tail
        assert_eq!(bits.segment_len(4), None);

        let exact = SegmentedBitset::new(1024, 256).unwrap();
        assert_eq!(exact.segment_count(), 4);
        assert_eq!(exact.segment_len(3), Some(256));
    }

    #[test]
    fn test_get_set_across_segment_boundaries() {
        // 70-bit segments: offsets straddle word boundaries inside a segment
        let mut bits = SegmentedBitset::new(500, 70).unwrap();
        for idx in [0, 63, 64, 69, 70, 71, 139, 140, 499] {
            assert!(!bits.get(idx).unwrap());
            bits.set(idx, true).unwrap();
            assert!(bits.get(idx).unwrap());
        }
        assert_eq!(bits.count_ones(), 9);
        assert!(!bits.get(68).unwrap());
        assert!(!bits.get(72).unwrap());

        bits.set(70, false).unwrap();
        assert!(!bits.get(70).unwrap());
        assert!(bits.get(69).unwrap());
        assert_eq!(bits.count_ones(), 8);
    }

    #[test]
    fn test_take_clears() {
        let mut bits = SegmentedBitset::new(128, 64).unwrap();
        bits.set(100, true).unwrap();
        assert!(bits.take(100).unwrap());
        assert!(!bits.take(100).unwrap());
        assert!(!bits.get(100).unwrap());
    }

    #[test]
    fn test_out_of_range() {
        let mut bits = SegmentedBitset::new(100, 30).unwrap();
        assert!(matches!(
            bits.get(100),
            Err(IntersectError::IndexOutOfRange {
                index: 100,
                domain_bits: 100
            })
        ));
        assert!(bits.set(u64::MAX, true).is_err());
        assert!(bits.take(200).is_err());
    }

    #[test]
    fn test_segment_size_is_not_observable() {
        let indices = [0u64, 1, 999, 1000, 4095, 65_535, 99_999];
        let mut small = SegmentedBitset::new(100_000, 1000).unwrap();
        let mut large = SegmentedBitset::new(100_000, 1 << 20).unwrap();
        for &i in &indices {
            small.set(i, true).unwrap();
            large.set(i, true).unwrap();
        }
        for i in 0..100_000 {
            assert_eq!(small.get(i).unwrap(), large.get(i).unwrap());
        }
    }

    #[test]
    fn test_full_domain_extremes() {
        let mut bits = SegmentedBitset::new(DOMAIN_BITS, 1 << 26).unwrap();
        assert_eq!(bits.segment_count(), 64);
        bits.set(to_index(i32::MIN), true).unwrap();
        bits.set(to_index(i32::MAX), true).unwrap();
        assert!(bits.get(0).unwrap());
        assert!(bits.get(DOMAIN_BITS - 1).unwrap());
        assert!(!bits.get(to_index(0)).unwrap());
        assert!(bits.get(DOMAIN_BITS).is_err());
    }
}
