use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

use crate::{RenewError, Wuid, layout::COUNTER_BITS};

/// A coordinator that hands out epochs.
///
/// Each call must return a value no other generator sharing the coordinator
/// has seen, typically by incrementing a persisted counter (a database row, a
/// key in a shared store, ...).
pub trait EpochSource: Send + Sync {
    /// Allocates the next epoch.
    ///
    /// # Errors
    /// Any failure reaching or updating the coordinator.
    fn next_epoch(&self) -> Result<u64, RenewError>;
}

impl<S> EpochSource for Arc<S>
where
    S: EpochSource + ?Sized,
{
    fn next_epoch(&self) -> Result<u64, RenewError> {
        (**self).next_epoch()
    }
}

/// Adapts a closure into an [`EpochSource`].
///
/// # Example
/// ```
/// use wuid::{FnEpochSource, Wuid};
///
/// let wuid = Wuid::new("callback");
/// wuid.load_h24(&FnEpochSource::new(|| Ok(42))).unwrap();
/// assert_eq!(wuid.epoch(), 42);
/// ```
#[derive(Clone, Debug)]
pub struct FnEpochSource<F> {
    f: F,
}

impl<F> FnEpochSource<F>
where
    F: Fn() -> Result<u64, RenewError> + Send + Sync,
{
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EpochSource for FnEpochSource<F>
where
    F: Fn() -> Result<u64, RenewError> + Send + Sync,
{
    fn next_epoch(&self) -> Result<u64, RenewError> {
        (self.f)()
    }
}

/// An in-process epoch counter.
///
/// Behaves like a counter row that is incremented on every allocation. Only
/// unique within one process, so it suits tests and single-host deployments.
#[derive(Debug, Default)]
pub struct MemoryEpochSource {
    last: AtomicU64,
}

impl MemoryEpochSource {
    /// Creates a source whose next allocation is `last + 1`.
    pub const fn new(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// The most recently allocated epoch.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

impl EpochSource for MemoryEpochSource {
    fn next_epoch(&self) -> Result<u64, RenewError> {
        Ok(self.last.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
    }
}

impl Wuid {
    /// Fetches an epoch from `source`, validates it and installs it with a
    /// zeroed counter.
    ///
    /// # Errors
    /// Fails if the source fails or returns an epoch rejected by
    /// [`Wuid::verify_h24`]. Nothing is installed in that case.
    pub fn load_h24(&self, source: &dyn EpochSource) -> Result<(), RenewError> {
        let h24 = source.next_epoch()?;
        self.verify_h24(h24)?;
        self.reset(h24 << COUNTER_BITS);

        if let Some(logger) = self.logger() {
            logger.info(&format!("[wuid] new h24: {h24}. tag: {}", self.tag()));
        }
        Ok(())
    }

    /// Loads the first epoch from `source` and makes every later renewal
    /// repeat the same load.
    ///
    /// # Errors
    /// Fails if the initial load fails; the renewal callback is left untouched
    /// in that case.
    pub fn load_h24_and_renew<S>(&self, source: S) -> Result<(), RenewError>
    where
        S: EpochSource + 'static,
    {
        let source = Arc::new(source);
        self.load_h24(source.as_ref())?;
        self.set_renew(move |wuid| wuid.load_h24(source.as_ref()));
        Ok(())
    }
}
