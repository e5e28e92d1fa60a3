//! Bit layout of a WUID.
//!
//! ```text
//! unsharded:  | epoch (24) |              counter (40) |
//! sharded:    | shard (4) | epoch (20) |  counter (40) |
//! ```
//!
//! The layout is the persisted contract: anything that decodes stored ids must
//! agree with it.

use core::fmt;

use crate::{Error, Result};

/// Number of low-order bits used by the local counter.
pub const COUNTER_BITS: u32 = 40;

/// Mask selecting the counter portion of an id.
pub const COUNTER_MASK: u64 = (1 << COUNTER_BITS) - 1;

/// Once the counter reaches this value (80% of its space) renewal is due.
pub const CRITICAL_VALUE: u64 = (1 << COUNTER_BITS) * 8 / 10;

/// Renewal is only attempted when `id & RENEW_INTERVAL == 0`, i.e. once every
/// `RENEW_INTERVAL + 1` ids past [`CRITICAL_VALUE`].
pub const RENEW_INTERVAL: u64 = 0x01_FFFF_FFFF;

/// Bit offset of the shard tag in a sharded id.
pub const SHARD_SHIFT: u32 = 60;

/// Mask clearing the shard tag out of an id.
pub const SHARD_CLEAR_MASK: u64 = (1 << SHARD_SHIFT) - 1;

/// Largest epoch accepted by an unsharded generator.
pub const H24_MAX: u64 = 0xFF_FFFF;

/// Largest epoch accepted by a sharded generator.
pub const H20_MAX: u64 = 0x0F_FFFF;

/// Returns `true` when `id` sits on a renewal boundary.
///
/// Both conditions are two bitwise operations, cheap enough for the issuing
/// path.
#[inline]
pub const fn renew_due(id: u64) -> bool {
    id & COUNTER_MASK >= CRITICAL_VALUE && id & RENEW_INTERVAL == 0
}

/// A validated 4-bit shard tag in `[1, 15]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shard(u8);

impl Shard {
    /// Smallest valid shard.
    pub const MIN: u8 = 1;
    /// Largest valid shard.
    pub const MAX: u8 = 15;

    /// Validates `shard`, rejecting `0` and anything that does not fit in four
    /// bits.
    ///
    /// # Example
    /// ```
    /// use wuid::{Error, Shard};
    ///
    /// assert_eq!(Shard::new(5).unwrap().get(), 5);
    /// assert_eq!(Shard::new(16), Err(Error::InvalidShard(16)));
    /// ```
    pub const fn new(shard: u8) -> Result<Self> {
        if shard < Self::MIN || shard > Self::MAX {
            return Err(Error::InvalidShard(shard));
        }
        Ok(Self(shard))
    }

    /// Returns the raw tag.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The tag shifted into its position in an id.
    pub const fn bits(self) -> u64 {
        (self.0 as u64) << SHARD_SHIFT
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Largest epoch a generator with the given shard configuration accepts.
#[inline]
pub const fn max_epoch(shard: Option<Shard>) -> u64 {
    match shard {
        Some(_) => H20_MAX,
        None => H24_MAX,
    }
}

/// The components of a decoded id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Parts {
    /// The coordinator-issued epoch (24 or 20 bits).
    pub epoch: u64,
    /// The shard tag, if the id was minted by a sharded generator.
    pub shard: Option<u8>,
    /// The local 40-bit counter.
    pub counter: u64,
}

impl Parts {
    /// Splits `id` according to the layout implied by `sharded`.
    ///
    /// The id does not record whether it was sharded, so the caller must know
    /// which generator minted it.
    ///
    /// # Example
    /// ```
    /// use wuid::Parts;
    ///
    /// let id = (5u64 << 60) | (0xABCDE << 40) | 42;
    /// let parts = Parts::decompose(id, true);
    /// assert_eq!(parts.shard, Some(5));
    /// assert_eq!(parts.epoch, 0xABCDE);
    /// assert_eq!(parts.counter, 42);
    /// ```
    pub const fn decompose(id: u64, sharded: bool) -> Self {
        let counter = id & COUNTER_MASK;
        if sharded {
            Self {
                epoch: (id & SHARD_CLEAR_MASK) >> COUNTER_BITS,
                shard: Some((id >> SHARD_SHIFT) as u8),
                counter,
            }
        } else {
            Self {
                epoch: id >> COUNTER_BITS,
                shard: None,
                counter,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_value_is_eighty_percent() {
        assert_eq!(CRITICAL_VALUE, 0xCC_CCCC_CCCC);
    }

    #[test]
    fn renew_due_requires_both_conditions() {
        // past the threshold but off the interval boundary
        assert!(!renew_due(CRITICAL_VALUE));
        // on a boundary but below the threshold
        assert!(!renew_due(0x2_0000_0000));
        assert!(renew_due(0xCE_0000_0000));
        assert!(renew_due((7 << COUNTER_BITS) | 0xCE_0000_0000));
        assert!(!renew_due(0xCE_0000_0001));
    }

    #[test]
    fn first_boundary_after_threshold() {
        let first = (CRITICAL_VALUE + RENEW_INTERVAL) & !RENEW_INTERVAL;
        assert_eq!(first, 0xCE_0000_0000);
        assert!(renew_due(first));
        // the previous boundary is still under the threshold
        assert!(!renew_due(first - (RENEW_INTERVAL + 1)));
    }

    #[test]
    fn shard_bounds() {
        assert_eq!(Shard::new(0), Err(Error::InvalidShard(0)));
        assert_eq!(Shard::new(16), Err(Error::InvalidShard(16)));
        assert_eq!(Shard::new(1).map(Shard::get), Ok(1));
        assert_eq!(Shard::new(15).map(Shard::bits), Ok(0xF << 60));
    }

    #[test]
    fn decompose_unsharded() {
        let id = (H24_MAX << COUNTER_BITS) | 7;
        let parts = Parts::decompose(id, false);
        assert_eq!(parts.epoch, H24_MAX);
        assert_eq!(parts.shard, None);
        assert_eq!(parts.counter, 7);
    }
}
