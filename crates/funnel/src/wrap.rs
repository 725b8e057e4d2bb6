//! Guarded - error-first callback adapter
//!
//! ```ignore
//! let funnel = Funnel::new();
//! let on_read = funnel.wrap(|_, bytes: Vec<u8>| parse(&bytes));
//!
//! // error-first: `Err` is raised, `Ok` runs the wrapped function
//! on_read.call(std::fs::read("input.bin"));
//!
//! // direct: arguments go straight to the wrapped function
//! on_read.exec(vec![1, 2, 3]);
//! ```

use contracts::ErrorValue;

use crate::funnel::Funnel;
use crate::unwind;

/// A function bound to a context whose failures are raised into a funnel.
///
/// The wrapped function receives the context and one argument (use a tuple
/// for several). Returning `Err` or panicking counts as a failure: the
/// failure is raised exactly once and the caller sees `None`.
pub struct Guarded<C, F> {
    funnel: Funnel,
    context: C,
    f: F,
}

impl<C, F> Guarded<C, F> {
    pub(crate) fn new(funnel: Funnel, context: C, f: F) -> Self {
        Self { funnel, context, f }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn funnel(&self) -> &Funnel {
        &self.funnel
    }

    /// Error-first entry point.
    ///
    /// `Err(error)` is raised and the wrapped function is not invoked;
    /// `Ok(args)` invokes it with the failure capture of [`Guarded::exec`].
    pub fn call<A, T, E, X>(&self, outcome: Result<A, X>) -> Option<T>
    where
        F: Fn(&C, A) -> Result<T, E>,
        E: Into<ErrorValue>,
        X: Into<ErrorValue>,
    {
        match outcome {
            Ok(args) => self.exec(args),
            Err(error) => {
                self.funnel.raise(error);
                None
            }
        }
    }

    /// Invoke the wrapped function directly, raising any failure
    pub fn exec<A, T, E>(&self, args: A) -> Option<T>
    where
        F: Fn(&C, A) -> Result<T, E>,
        E: Into<ErrorValue>,
    {
        match unwind::capture(|| (self.f)(&self.context, args)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.funnel.raise(error);
                None
            }
            Err(panic) => {
                self.funnel.raise(panic);
                None
            }
        }
    }
}
