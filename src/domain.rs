//! Mapping between signed 32-bit values and absolute bitset indices.
//!
//! The domain is every representable `i32`, ordered as integers. Shifting by
//! `i32::MIN` maps it onto `[0, 2^32)` without gaps, so `i32::MIN` lands on
//! index 0 and `i32::MAX` on the last bit.

/// Number of values in the domain (2^32).
pub const DOMAIN_BITS: u64 = 1 << 32;

/// Map a value to its absolute bitset index.
#[inline]
pub const fn to_index(value: i32) -> u64 {
    (value as i64 - i32::MIN as i64) as u64
}

/// Inverse of [`to_index`]. Returns `None` outside the domain.
#[inline]
pub const fn from_index(index: u64) -> Option<i32> {
    if index >= DOMAIN_BITS {
        return None;
    }
    Some((index as i64 + i32::MIN as i64) as i32)
}
