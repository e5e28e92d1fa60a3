/// Sink for the generator's diagnostics.
///
/// Only the renewal path logs: one `info` line per successful renewal, one
/// `warn` line per failed or panicked one. A generator without a logger drops
/// these messages.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// A [`Logger`] forwarding to [`tracing`](https://docs.rs/tracing) events.
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "wuid", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "wuid", "{message}");
    }
}
