//! # Funnel
//!
//! 进程级错误汇聚模块。
//!
//! 负责：
//! - 通过单一 `"error"` 主题分发错误
//! - 隔离监听器 panic，保证每个监听器都被调用
//! - 驱动文件、邮件、tracing 等 sink，慢 sink 不阻塞调用方
//! - 包装回调与 future，把失败统一送入通道

pub mod channel;
pub mod error;
pub mod funnel;
pub mod guard;
pub mod handle;
pub mod metrics;
pub mod normalize;
pub mod sinks;
pub mod title;
mod unwind;
pub mod wrap;

pub use channel::DispatchChannel;
pub use contracts::{ErrorEmitter, ErrorReport, ErrorSink, ErrorValue, Listener, Topic};
pub use error::FunnelError;
pub use funnel::{DEFAULT_BACKLOG_WARNING, Funnel};
pub use guard::ProcessGuard;
pub use handle::{SinkHandle, SinkSender};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{EmailSink, FileSink, LogSink};
#[cfg(feature = "smtp")]
pub use sinks::SmtpMailer;
pub use title::Title;
pub use wrap::Guarded;
