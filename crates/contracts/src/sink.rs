//! ErrorSink trait - funnel output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, ErrorValue};

/// Error sink trait
///
/// A sink performs a side effect (durable write, network send) for every
/// error it is handed. All sink implementations must implement this trait.
#[trait_variant::make(ErrorSink: Send)]
pub trait LocalErrorSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Handle one error
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, error: &ErrorValue) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
