//! Title - funnel-wide email subject override

use std::sync::{Arc, PoisonError, RwLock};

/// Shared, settable subject line.
///
/// When set, email sinks use it instead of the stringified error.
#[derive(Debug, Clone, Default)]
pub struct Title(Arc<RwLock<Option<String>>>);

impl Title {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, title: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = title;
    }
}
