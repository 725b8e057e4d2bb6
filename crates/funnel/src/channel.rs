//! DispatchChannel - topic registry and synchronous fan-out

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace, warn};

use contracts::{ErrorValue, Listener, Topic};

use crate::unwind;

/// Publish/subscribe bus keyed by [`Topic`].
///
/// Listeners run synchronously on the publishing thread, in registration
/// order. Each publish works on a snapshot of the topic's listeners:
/// registrations made while a publish is running take effect from the next
/// publish, and removals never affect the in-flight one.
#[derive(Default)]
pub struct DispatchChannel {
    listeners: RwLock<HashMap<Topic, Vec<Listener>>>,
}

impl DispatchChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` under `topic`
    pub fn on(&self, topic: impl Into<Topic>, listener: Listener) -> &Self {
        let topic = topic.into();
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let registered = listeners.entry(topic.clone()).or_default();
        registered.push(listener);
        debug!(topic = %topic, listeners = registered.len(), "Listener registered");
        self
    }

    /// Remove the most recent registration of `listener` under `topic`.
    ///
    /// Unknown listeners are ignored.
    pub fn off(&self, topic: impl Into<Topic>, listener: &Listener) -> &Self {
        let topic = topic.into();
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(registered) = listeners.get_mut(&topic) {
            if let Some(idx) = registered.iter().rposition(|l| Arc::ptr_eq(l, listener)) {
                registered.remove(idx);
                debug!(topic = %topic, listeners = registered.len(), "Listener removed");
            }
            if registered.is_empty() {
                listeners.remove(&topic);
            }
        }
        self
    }

    /// Deliver `value` to every listener of `topic`
    pub fn emit(&self, topic: impl Into<Topic>, value: impl Into<ErrorValue>) -> &Self {
        let topic = topic.into();
        let value = value.into();
        let snapshot = self.snapshot(&topic);

        observability::record_error_raised(topic.as_str());
        if snapshot.is_empty() {
            trace!(topic = %topic, "No listeners, value dropped");
            return self;
        }

        for listener in snapshot {
            if let Err(panic) = unwind::capture(|| listener(&value)) {
                observability::record_listener_panic(topic.as_str());
                warn!(
                    topic = %topic,
                    panic = %panic,
                    "Listener panicked, continuing dispatch"
                );
            }
        }
        self
    }

    /// Deliver `value` on the reserved `"error"` topic
    pub fn raise(&self, value: impl Into<ErrorValue>) -> &Self {
        self.emit(Topic::ERROR, value)
    }

    /// Number of listeners currently registered under `topic`
    pub fn listener_count(&self, topic: impl Into<Topic>) -> usize {
        let topic = topic.into();
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }

    fn snapshot(&self, topic: &Topic) -> Vec<Listener> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for DispatchChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(topic, registered)| (topic.as_str(), registered.len()))
            .collect();
        f.debug_struct("DispatchChannel")
            .field("listeners", &counts)
            .finish()
    }
}
