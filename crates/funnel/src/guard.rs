//! ProcessGuard - routes uncaught panics into a funnel
//!
//! The panic hook never runs listeners itself. It hands the report to a
//! dedicated dispatcher thread and waits for that raise to finish, so a
//! listener that panics is isolated there like anywhere else instead of
//! panicking inside the hook.

use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use contracts::{ErrorReport, ErrorValue, Listener};
use tracing::{info, warn};

use crate::error::FunnelError;
use crate::funnel::Funnel;
use crate::unwind;

static INSTALLED: AtomicBool = AtomicBool::new(false);

const DISPATCH_THREAD: &str = "sluice-guard";

/// Upper bound on how long a panicking thread waits for its report to be raised
const HANDOFF_TIMEOUT: Duration = Duration::from_secs(2);

struct Delivery {
    value: ErrorValue,
    done: mpsc::SyncSender<()>,
}

/// Process-wide panic hook bound to one funnel.
///
/// Every panic not already captured by the funnel (listener isolation,
/// [`crate::Guarded`], `swear`) is raised as an `ErrorReport` of kind
/// `"panic"` before the previously installed hook runs. The panic still
/// unwinds or aborts as it would have.
///
/// The guard holds the funnel weakly: once every `Funnel` handle is gone,
/// panics only reach the previous hook.
pub struct ProcessGuard;

impl ProcessGuard {
    /// Install the hook. Only one guard may exist per process.
    pub fn install(funnel: &Funnel) -> Result<(), FunnelError> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(FunnelError::GuardInstalled);
        }

        let deliveries = match spawn_dispatcher(funnel.raiser()) {
            Ok(deliveries) => deliveries,
            Err(e) => {
                INSTALLED.store(false, Ordering::SeqCst);
                return Err(FunnelError::Io(e));
            }
        };

        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let location = info.location().map(ToString::to_string);

            if unwind::is_capturing() {
                if let Some(location) = location {
                    unwind::note_location(location);
                }
                return;
            }

            // the dispatcher cannot wait on itself
            if thread::current().name() != Some(DISPATCH_THREAD) {
                let (done, finished) = mpsc::sync_channel(1);
                let delivery = Delivery {
                    value: panic_report(info, location),
                    done,
                };
                if deliveries.send(delivery).is_ok()
                    && finished.recv_timeout(HANDOFF_TIMEOUT).is_err()
                {
                    warn!("Process guard timed out raising a panic");
                }
            }
            previous(info);
        }));

        info!("Process guard installed");
        Ok(())
    }

    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::SeqCst)
    }
}

fn spawn_dispatcher(raise: Listener) -> std::io::Result<mpsc::Sender<Delivery>> {
    let (tx, rx) = mpsc::channel::<Delivery>();
    thread::Builder::new()
        .name(DISPATCH_THREAD.to_string())
        .spawn(move || {
            for delivery in rx {
                // listeners are isolated by the channel; this covers the rest
                if let Err(e) = unwind::capture(|| raise(&delivery.value)) {
                    warn!(error = %e, "Process guard failed to raise a panic");
                }
                let _ = delivery.done.send(());
            }
        })?;
    Ok(tx)
}

fn panic_report(info: &PanicHookInfo<'_>, location: Option<String>) -> ErrorValue {
    let message = ErrorValue::from_panic(info.payload()).to_string();
    let mut report = ErrorReport::new(message).with_kind("panic");
    if let Some(location) = location {
        report = report.with_location(location);
    }
    ErrorValue::from(report)
}
