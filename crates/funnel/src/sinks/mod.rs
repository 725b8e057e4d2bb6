//! Sink implementations
//!
//! Contains FileSink, EmailSink, LogSink and the SMTP mail transport.

mod email;
mod file;
mod log;
#[cfg(feature = "smtp")]
mod smtp;

pub use self::email::EmailSink;
pub use self::file::FileSink;
pub use self::log::LogSink;
#[cfg(feature = "smtp")]
pub use self::smtp::SmtpMailer;
