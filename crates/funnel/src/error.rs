//! Funnel error types

use thiserror::Error;

/// Funnel-specific errors
#[derive(Debug, Error)]
pub enum FunnelError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink workers need a Tokio runtime
    #[error("no Tokio runtime available to run sink workers")]
    NoRuntime,

    /// Process guard installed twice
    #[error("process guard is already installed")]
    GuardInstalled,

    /// Contract error (config, mail, sink)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FunnelError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
