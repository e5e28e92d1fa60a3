use thiserror::Error;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The error type returned by a renewal callback or an [`EpochSource`].
///
/// Storage drivers surface their own error types; boxing them lets a callback
/// use `?` against any of them.
///
/// [`EpochSource`]: crate::EpochSource
pub type RenewError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All error variants that `wuid` can emit.
///
/// Issuance itself is infallible. Errors only come from construction (an
/// invalid shard) and from epoch validation.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The shard passed to the builder is outside `[1, 15]`.
    ///
    /// An out-of-range shard would alias another generator's id space, so it is
    /// rejected rather than clamped.
    #[error("shard must be in between [1, 15], got {0}")]
    InvalidShard(u8),

    /// Epoch `0` is reserved: it would make the high bits indistinguishable
    /// from an unset generator.
    #[error("the h24 should not be 0. tag: {tag}")]
    ZeroEpoch { tag: String },

    /// The epoch does not fit the width left for it by the layout.
    #[error("the h{bits} should not exceed {max:#x}. tag: {tag}")]
    EpochOverflow { tag: String, bits: u32, max: u64 },
}
