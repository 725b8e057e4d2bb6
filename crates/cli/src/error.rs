//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Wrapped command could not be started
    #[error("Failed to start `{command}`: {message}")]
    CommandSpawn { command: String, message: String },

    /// Wrapped command exited unsuccessfully
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn command_spawn(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandSpawn {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
        }
    }
}
