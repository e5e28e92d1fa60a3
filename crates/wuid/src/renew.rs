use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use crate::{RenewError, Wuid};

/// The renewal callback.
///
/// It receives the generator it renews, fetches a fresh epoch from the
/// coordinator, passes it through [`Wuid::verify_h24`] and installs it with
/// [`Wuid::reset`]. On failure it returns the cause and installs nothing.
pub type RenewFn = dyn Fn(&Wuid) -> Result<(), RenewError> + Send + Sync + 'static;

/// Callback installed until the caller configures a real one.
pub(crate) fn unconfigured(wuid: &Wuid) -> Result<(), RenewError> {
    Err(format!("no renew function configured. tag: {}", wuid.tag()).into())
}

/// Runs one renewal attempt behind a panic boundary and reports the outcome.
///
/// Nothing escapes this function: error returns and panics both end up as a
/// warning on the generator's logger, if it has one.
pub(crate) fn run(wuid: &Wuid, renew: &RenewFn) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| renew(wuid)));

    let Some(logger) = wuid.logger() else {
        return;
    };
    match outcome {
        Ok(Ok(())) => logger.info(&format!("[wuid] renew succeeded. tag: {}", wuid.tag())),
        Ok(Err(err)) => logger.warn(&format!(
            "[wuid] renew failed. tag: {}, reason: {err}",
            wuid.tag()
        )),
        Err(payload) => logger.warn(&format!(
            "[wuid] panic. tag: {}, reason: {}",
            wuid.tag(),
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::tests::RecordingLogger;
    use std::sync::Arc;

    fn wuid_with_logger() -> (Wuid, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::default());
        let wuid = Wuid::builder("renew-test")
            .logger(logger.clone())
            .build()
            .unwrap();
        (wuid, logger)
    }

    #[test]
    fn success_logs_info() {
        let (wuid, logger) = wuid_with_logger();
        run(&wuid, &|w: &Wuid| {
            w.reset(1 << 40);
            Ok(())
        });
        assert_eq!(wuid.current(), 1 << 40);
        assert_eq!(
            logger.infos.lock().unwrap().as_slice(),
            ["[wuid] renew succeeded. tag: renew-test"]
        );
        assert!(logger.warns.lock().unwrap().is_empty());
    }

    #[test]
    fn error_logs_warning_with_reason() {
        let (wuid, logger) = wuid_with_logger();
        run(&wuid, &|_: &Wuid| Err("database is down".into()));
        assert_eq!(
            logger.warns.lock().unwrap().as_slice(),
            ["[wuid] renew failed. tag: renew-test, reason: database is down"]
        );
    }

    #[test]
    fn panic_is_contained() {
        let (wuid, logger) = wuid_with_logger();
        run(&wuid, &|_: &Wuid| panic!("coordinator exploded"));
        assert_eq!(
            logger.warns.lock().unwrap().as_slice(),
            ["[wuid] panic. tag: renew-test, reason: coordinator exploded"]
        );
    }

    #[test]
    fn formatted_panic_message_is_reported() {
        let (wuid, logger) = wuid_with_logger();
        run(&wuid, &|_: &Wuid| panic!("epoch {} rejected", 7));
        assert_eq!(
            logger.warns.lock().unwrap().as_slice(),
            ["[wuid] panic. tag: renew-test, reason: epoch 7 rejected"]
        );
    }

    #[test]
    fn missing_logger_is_silent() {
        let wuid = Wuid::new("quiet");
        run(&wuid, &|_: &Wuid| Err("ignored".into()));
        run(&wuid, &|_: &Wuid| panic!("ignored"));
        assert_eq!(wuid.current(), 0);
    }

    #[test]
    fn unconfigured_renew_fails() {
        let (wuid, logger) = wuid_with_logger();
        run(&wuid, &unconfigured);
        assert_eq!(
            logger.warns.lock().unwrap().as_slice(),
            ["[wuid] renew failed. tag: renew-test, reason: no renew function configured. tag: renew-test"]
        );
    }
}
