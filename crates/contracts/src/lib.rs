//! # Contracts
//!
//! Frozen interface contracts shared by every sluice crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Error model
//! - Every error is an opaque [`ErrorValue`], no severity or category
//! - Delivery happens on a [`Topic`]; `"error"` is the reserved primary topic
//! - Sinks implement [`ErrorSink`], mail goes through a [`MailTransport`]

mod config;
mod emitter;
mod error;
mod error_value;
mod mail;
mod sink;
mod topic;

pub use config::*;
pub use emitter::{ErrorEmitter, Listener};
pub use error::*;
pub use error_value::{ErrorReport, ErrorValue};
pub use mail::*;
pub use sink::*;
pub use topic::Topic;
