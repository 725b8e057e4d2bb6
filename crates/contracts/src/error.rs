//! ContractError - failures shared across crates

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors raised by configuration loading, sinks and mail transports
#[derive(Debug, Error)]
pub enum ContractError {
    /// Config text could not be parsed or deserialized
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Config parsed but a value is not acceptable
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// No layer of a config namespace provided any value
    #[error("config namespace '{namespace}' not found: {message}")]
    ConfigNotFound { namespace: String, message: String },

    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Message could not be built or delivered
    #[error("mail transport error: {message}")]
    MailTransport { message: String },

    #[error("invalid mail address '{address}'")]
    InvalidAddress { address: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Parse error keeping the underlying error as its source
    pub fn config_parse_caused<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn config_not_found(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigNotFound {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn mail_transport(message: impl Into<String>) -> Self {
        Self::MailTransport {
            message: message.into(),
        }
    }

    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }
}
