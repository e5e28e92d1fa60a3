use std::{io, thread};

/// A unit of background work dispatched by the generator.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs renewal tasks off the issuing path.
///
/// Implementations must not run the task on the calling thread: `next` is
/// expected to return without waiting on the coordinator.
pub trait Executor: Send + Sync {
    /// Dispatches `task` without waiting for it.
    ///
    /// # Errors
    /// Returns an error if the task could not be scheduled at all. The task is
    /// dropped in that case and the next throttle window will retry.
    fn spawn(&self, task: Task) -> io::Result<()>;
}

/// Spawns a detached OS thread per renewal.
///
/// Renewals happen at most once every few billion ids, so a dedicated thread
/// per attempt costs nothing measurable and needs no runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn spawn(&self, task: Task) -> io::Result<()> {
        thread::Builder::new()
            .name("wuid-renew".into())
            .spawn(task)
            .map(drop)
    }
}

/// Runs renewals on a Tokio runtime's blocking pool.
///
/// Renewal callbacks are synchronous and usually block on I/O, so they go to
/// [`spawn_blocking`] rather than the async worker threads.
///
/// [`spawn_blocking`]: tokio::runtime::Handle::spawn_blocking
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async-tokio")]
impl TokioExecutor {
    /// Uses the given runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Captures the runtime the caller is running on.
    ///
    /// # Errors
    /// Fails when called outside a Tokio runtime.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        tokio::runtime::Handle::try_current().map(Self::new)
    }
}

#[cfg(feature = "async-tokio")]
impl Executor for TokioExecutor {
    fn spawn(&self, task: Task) -> io::Result<()> {
        drop(self.handle.spawn_blocking(task));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn thread_executor_runs_on_another_thread() {
        let (tx, rx) = mpsc::channel();
        let caller = thread::current().id();
        ThreadExecutor
            .spawn(Box::new(move || {
                tx.send(thread::current().id()).unwrap();
            }))
            .unwrap();
        let worker = rx.recv().unwrap();
        assert_ne!(worker, caller);
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test(flavor = "multi_thread")]
    async fn tokio_executor_runs_task() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let executor = TokioExecutor::current().unwrap();
        executor
            .spawn(Box::new(move || {
                tx.send(42).unwrap();
            }))
            .unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[cfg(feature = "async-tokio")]
    #[test]
    fn tokio_executor_requires_runtime() {
        assert!(TokioExecutor::current().is_err());
    }
}
