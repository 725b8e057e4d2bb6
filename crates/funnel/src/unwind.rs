//! Panic capture shared by the channel and the wrapper
//!
//! A thread-local depth counter marks regions where the funnel itself will
//! catch a panic, so the process guard does not report it a second time.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};

use contracts::{ErrorReport, ErrorValue};

thread_local! {
    static CAPTURE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Restores the depth on drop, including when unwinding
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether the current thread is inside a funnel capture region
pub(crate) fn is_capturing() -> bool {
    CAPTURE_DEPTH.with(Cell::get) > 0
}

/// Remember where the in-flight captured panic happened
pub(crate) fn note_location(location: String) {
    LAST_LOCATION.with(|last| *last.borrow_mut() = Some(location));
}

/// Run `f`, converting a panic into an [`ErrorValue`]
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> Result<R, ErrorValue> {
    let result = {
        let _depth = DepthGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };

    result.map_err(|payload| {
        let location = LAST_LOCATION.with(|last| last.borrow_mut().take());
        let message = ErrorValue::from_panic(payload.as_ref()).to_string();
        let mut report = ErrorReport::new(message).with_kind("panic");
        if let Some(location) = location {
            report = report.with_location(location);
        }
        ErrorValue::from(report)
    })
}
