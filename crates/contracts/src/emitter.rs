//! Listener and ErrorEmitter - bridging external error sources

use std::sync::Arc;

use crate::ErrorValue;

/// A registered callback. Identity (for unsubscribe) is the `Arc` pointer.
pub type Listener = Arc<dyn Fn(&ErrorValue) + Send + Sync>;

/// Anything that reports its own errors to subscribed listeners.
///
/// Implemented by third-party adapters so their errors can be bridged
/// into a funnel.
pub trait ErrorEmitter {
    /// Subscribe `listener` to this emitter's error notifications
    fn on_error(&self, listener: Listener);
}
