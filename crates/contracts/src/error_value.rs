//! ErrorValue - opaque payload carried through the funnel
//!
//! Immutable once created; clones share the same allocation.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::ContractError;

/// An opaque error value: plain message, structured error or arbitrary data.
#[derive(Debug, Clone)]
pub enum ErrorValue {
    /// Plain message
    Message(Arc<str>),
    /// Structured error with its source chain
    Report(Arc<ErrorReport>),
    /// Arbitrary structured payload
    Data(Arc<serde_json::Value>),
}

/// Structured error captured from a `std::error::Error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Top-level error message
    pub message: String,
    /// Type name of the captured error, if known
    pub kind: Option<String>,
    /// Messages of the `source()` chain, outermost first
    pub chain: Vec<String>,
    /// Source location, for captured panics
    pub location: Option<String>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            chain: Vec::new(),
            location: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.chain.push(cause.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Capture an error and walk its `source()` chain
    pub fn capture(err: &(dyn StdError + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            kind: None,
            chain,
            location: None,
        }
    }
}

impl ErrorValue {
    /// Create a plain message value
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(Arc::from(message.into()))
    }

    /// Capture a typed error, recording its type name and source chain
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + 'static,
    {
        let report = ErrorReport::capture(err).with_kind(std::any::type_name::<E>());
        Self::Report(Arc::new(report))
    }

    /// Convert a panic payload (as returned by `catch_unwind`) into a value
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Self::message(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::message(message.clone())
        } else if let Some(value) = payload.downcast_ref::<ErrorValue>() {
            value.clone()
        } else {
            Self::message("panic with non-string payload")
        }
    }

    /// Structured report, if this value carries one
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Report(report) => Some(report),
            _ => None,
        }
    }

    /// Whether two values share the same allocation
    pub fn ptr_eq(&self, other: &ErrorValue) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => Arc::ptr_eq(a, b),
            (Self::Report(a), Self::Report(b)) => Arc::ptr_eq(a, b),
            (Self::Data(a), Self::Data(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Report(report) => f.write_str(&report.message),
            Self::Data(value) => match value.as_ref() {
                serde_json::Value::String(s) => f.write_str(s),
                other => write!(f, "{other}"),
            },
        }
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ErrorReport", 4)?;
        state.serialize_field("message", &self.message)?;
        if let Some(kind) = &self.kind {
            state.serialize_field("kind", kind)?;
        } else {
            state.skip_field("kind")?;
        }
        state.serialize_field("chain", &self.chain)?;
        if let Some(location) = &self.location {
            state.serialize_field("location", location)?;
        } else {
            state.skip_field("location")?;
        }
        state.end()
    }
}

impl Serialize for ErrorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Message(message) => serializer.serialize_str(message),
            Self::Report(report) => report.serialize(serializer),
            Self::Data(value) => value.serialize(serializer),
        }
    }
}

impl PartialEq for ErrorValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Report(a), Self::Report(b)) => a == b,
            (Self::Data(a), Self::Data(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for ErrorValue {
    fn from(message: &str) -> Self {
        Self::message(message)
    }
}

impl From<String> for ErrorValue {
    fn from(message: String) -> Self {
        Self::message(message)
    }
}

impl From<serde_json::Value> for ErrorValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(Arc::new(value))
    }
}

impl From<ErrorReport> for ErrorValue {
    fn from(report: ErrorReport) -> Self {
        Self::Report(Arc::new(report))
    }
}

impl From<std::io::Error> for ErrorValue {
    fn from(err: std::io::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<serde_json::Error> for ErrorValue {
    fn from(err: serde_json::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<ContractError> for ErrorValue {
    fn from(err: ContractError) -> Self {
        Self::from_error(&err)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for ErrorValue {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        Self::Report(Arc::new(ErrorReport::capture(err.as_ref())))
    }
}

impl From<anyhow::Error> for ErrorValue {
    fn from(err: anyhow::Error) -> Self {
        let report = ErrorReport {
            message: err.to_string(),
            kind: None,
            chain: err.chain().skip(1).map(ToString::to_string).collect(),
            location: None,
        };
        Self::Report(Arc::new(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_message_display_is_text() {
        let value = ErrorValue::from("boom");
        assert_eq!(value.to_string(), "boom");
        assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!("boom"));
    }

    #[test]
    fn test_from_error_captures_chain_and_kind() {
        let err = Outer {
            inner: std::io::Error::other("disk full"),
        };
        let value = ErrorValue::from_error(&err);
        let report = value.report().unwrap();

        assert_eq!(report.message, "outer failure");
        assert_eq!(report.chain, vec!["disk full".to_string()]);
        assert!(report.kind.as_deref().unwrap().ends_with("Outer"));
        assert_eq!(value.to_string(), "outer failure");
    }

    #[test]
    fn test_from_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(ErrorValue::from_panic(payload.as_ref()).to_string(), "static str");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(ErrorValue::from_panic(payload.as_ref()).to_string(), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(
            ErrorValue::from_panic(payload.as_ref()).to_string(),
            "panic with non-string payload"
        );
    }

    #[test]
    fn test_data_display() {
        let value = ErrorValue::from(serde_json::json!({"code": 7}));
        assert_eq!(value.to_string(), r#"{"code":7}"#);

        let value = ErrorValue::from(serde_json::json!("plain"));
        assert_eq!(value.to_string(), "plain");
    }

    #[test]
    fn test_clones_share_allocation() {
        let value = ErrorValue::from("shared");
        let clone = value.clone();
        assert!(value.ptr_eq(&clone));
        assert!(!value.ptr_eq(&ErrorValue::from("shared")));
        assert_eq!(value, ErrorValue::from("shared"));
    }

    #[test]
    fn test_anyhow_chain() {
        let err = anyhow::anyhow!("root cause").context("while sending");
        let value = ErrorValue::from(err);
        let report = value.report().unwrap();
        assert_eq!(report.message, "while sending");
        assert_eq!(report.chain, vec!["root cause".to_string()]);
    }
}
