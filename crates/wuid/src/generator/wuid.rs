use std::{fmt, sync::Arc};

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::mutex::{Mutex, lock};
use crate::{
    Error, Executor, Logger, Parts, RenewError, RenewFn, Result, Shard, ThreadExecutor,
    layout::{SHARD_CLEAR_MASK, max_epoch, renew_due},
    renew,
};

/// A lock-free generator of 64-bit ids made of a coordinator-issued epoch and
/// a local 40-bit counter.
///
/// `Wuid` is a cheap handle: clones share the same counter, so it can be
/// handed to as many threads as needed.
///
/// Before issuing ids the generator must be given an epoch, either by calling
/// [`Wuid::reset`] with a validated value or through [`Wuid::load_h24`]. Once
/// the counter has consumed 80% of its space, [`Wuid::next`] periodically
/// dispatches the renewal callback on the configured [`Executor`] to fetch a
/// fresh epoch; issuance never waits on it.
///
/// # Example
/// ```
/// use wuid::{MemoryEpochSource, Wuid};
///
/// let wuid = Wuid::new("orders");
/// wuid.load_h24_and_renew(MemoryEpochSource::new(0)).unwrap();
///
/// let a = wuid.next();
/// let b = wuid.next();
/// assert_eq!(a, (1 << 40) + 1);
/// assert!(a < b);
/// ```
#[derive(Clone)]
pub struct Wuid {
    inner: Arc<Inner>,
}

struct Inner {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    shard: Option<Shard>,
    tag: String,
    logger: Option<Arc<dyn Logger>>,
    renew: Mutex<Arc<RenewFn>>,
    executor: Arc<dyn Executor>,
}

impl Wuid {
    /// Creates an unsharded generator without a logger, renewing on a
    /// [`ThreadExecutor`].
    pub fn new(tag: impl Into<String>) -> Self {
        Self::from_parts(tag.into(), None, None, Arc::new(ThreadExecutor), None)
    }

    /// Starts configuring a generator.
    pub fn builder(tag: impl Into<String>) -> WuidBuilder {
        WuidBuilder::new(tag)
    }

    fn from_parts(
        tag: String,
        shard: Option<Shard>,
        logger: Option<Arc<dyn Logger>>,
        executor: Arc<dyn Executor>,
        renew: Option<Arc<RenewFn>>,
    ) -> Self {
        let initial = shard.map_or(0, Shard::bits);
        let renew = renew.unwrap_or_else(|| Arc::new(renew::unconfigured));
        Self {
            inner: Arc::new(Inner {
                state: AtomicU64::new(initial).into(),
                shard,
                tag,
                logger,
                renew: Mutex::new(renew),
                executor,
            }),
        }
    }

    /// Issues the next id.
    ///
    /// This is a single atomic increment. When the new value lands on a
    /// renewal boundary (counter past 80% and aligned to the renewal
    /// interval) the renewal callback is dispatched in the background; the
    /// id is returned without waiting for it.
    #[allow(clippy::should_implement_trait)]
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self) -> u64 {
        // One cell holds all state, so its modification order alone
        // linearizes issuance.
        let id = self.inner.state.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if renew_due(id) {
            self.dispatch_renew();
        }
        id
    }

    #[cold]
    fn dispatch_renew(&self) {
        let renew = self.renew_fn();
        let wuid = self.clone();
        let task = Box::new(move || renew::run(&wuid, renew.as_ref()));
        if let Err(err) = self.inner.executor.spawn(task) {
            if let Some(logger) = self.logger() {
                logger.warn(&format!(
                    "[wuid] renew could not be scheduled. tag: {}, reason: {err}",
                    self.inner.tag
                ));
            }
        }
    }

    /// Installs a new value, normally `epoch << 40`.
    ///
    /// On a sharded generator the top four bits of `n` are replaced by the
    /// shard tag, so a renewal can never change the shard identity. The value
    /// is **not** validated: run the epoch through [`Wuid::verify_h24`] first.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(tag = %self.inner.tag))
    )]
    pub fn reset(&self, n: u64) {
        let value = match self.inner.shard {
            Some(shard) => (n & SHARD_CLEAR_MASK) | shard.bits(),
            None => n,
        };
        self.inner.state.store(value, Ordering::Relaxed);
    }

    /// Checks that `h24` is a usable epoch for this generator.
    ///
    /// # Errors
    /// - [`Error::ZeroEpoch`] if `h24` is `0`
    /// - [`Error::EpochOverflow`] if it exceeds `0xFFFFFF`, or `0x0FFFFF` when
    ///   the generator is sharded
    ///
    /// # Example
    /// ```
    /// use wuid::Wuid;
    ///
    /// let wuid = Wuid::new("verify");
    /// assert!(wuid.verify_h24(0xFF_FFFF).is_ok());
    /// assert!(wuid.verify_h24(0x100_0000).is_err());
    /// assert!(wuid.verify_h24(0).is_err());
    /// ```
    pub fn verify_h24(&self, h24: u64) -> Result<()> {
        if h24 == 0 {
            return Err(Error::ZeroEpoch {
                tag: self.inner.tag.clone(),
            });
        }
        let max = max_epoch(self.inner.shard);
        if h24 > max {
            return Err(Error::EpochOverflow {
                tag: self.inner.tag.clone(),
                bits: max.count_ones(),
                max,
            });
        }
        Ok(())
    }

    /// Replaces the renewal callback.
    ///
    /// In-flight renewals keep the callback they started with.
    pub fn set_renew<F>(&self, renew: F)
    where
        F: Fn(&Wuid) -> Result<(), RenewError> + Send + Sync + 'static,
    {
        *lock(&self.inner.renew) = Arc::new(renew);
    }

    /// Snapshot of the current renewal callback.
    pub(crate) fn renew_fn(&self) -> Arc<RenewFn> {
        Arc::clone(&*lock(&self.inner.renew))
    }

    /// The most recently issued (or installed) value.
    pub fn current(&self) -> u64 {
        self.inner.state.load(Ordering::Relaxed)
    }

    /// Splits `id` according to this generator's layout.
    pub fn decompose(&self, id: u64) -> Parts {
        Parts::decompose(id, self.inner.shard.is_some())
    }

    /// The epoch currently installed.
    pub fn epoch(&self) -> u64 {
        self.decompose(self.current()).epoch
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn shard(&self) -> Option<Shard> {
        self.inner.shard
    }

    pub fn logger(&self) -> Option<&dyn Logger> {
        self.inner.logger.as_deref()
    }

    /// Bits available to the epoch: 24, or 20 when sharded.
    pub fn epoch_bits(&self) -> u32 {
        max_epoch(self.inner.shard).count_ones()
    }
}

impl fmt::Debug for Wuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wuid")
            .field("tag", &self.inner.tag)
            .field("shard", &self.inner.shard)
            .field("current", &format_args!("{:#018x}", self.current()))
            .field("logger", &self.inner.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// Options for constructing a [`Wuid`].
///
/// Validation happens in [`WuidBuilder::build`], so an invalid shard aborts
/// construction before any id is issued.
#[must_use]
pub struct WuidBuilder {
    tag: String,
    shard: Option<u8>,
    logger: Option<Arc<dyn Logger>>,
    executor: Option<Arc<dyn Executor>>,
    renew: Option<Arc<RenewFn>>,
}

impl WuidBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            shard: None,
            logger: None,
            executor: None,
            renew: None,
        }
    }

    /// Reserves the top four bits for `shard`, which must be in `[1, 15]`.
    ///
    /// Shrinks the epoch to 20 bits.
    pub fn shard(mut self, shard: u8) -> Self {
        self.shard = Some(shard);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Where renewals run. Defaults to [`ThreadExecutor`].
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn renew<F>(mut self, renew: F) -> Self
    where
        F: Fn(&Wuid) -> Result<(), RenewError> + Send + Sync + 'static,
    {
        self.renew = Some(Arc::new(renew));
        self
    }

    /// Builds the generator.
    ///
    /// # Errors
    /// Returns [`Error::InvalidShard`] when the shard is `0` or above `15`.
    ///
    /// # Example
    /// ```
    /// use wuid::{Error, Wuid};
    ///
    /// let err = Wuid::builder("bad").shard(16).build().unwrap_err();
    /// assert_eq!(err, Error::InvalidShard(16));
    /// ```
    pub fn build(self) -> Result<Wuid> {
        let shard = self.shard.map(Shard::new).transpose()?;
        let executor = self.executor.unwrap_or_else(|| Arc::new(ThreadExecutor));
        Ok(Wuid::from_parts(
            self.tag,
            shard,
            self.logger,
            executor,
            self.renew,
        ))
    }
}
