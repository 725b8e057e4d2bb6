//! Per-sink delivery counters
//!
//! Every event is also mirrored into the process-wide `metrics` recorder
//! under the sink's name.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::ContractError;

/// Delivery counters of one sink worker
#[derive(Debug)]
pub struct SinkMetrics {
    sink: Arc<str>,
    queued: AtomicUsize,
    peak: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl SinkMetrics {
    pub fn new(sink: impl Into<Arc<str>>) -> Self {
        Self {
            sink: sink.into(),
            queued: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    /// One more error waiting for the worker; returns the new backlog
    pub(crate) fn enqueued(&self) -> usize {
        let backlog = self.queued.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak.fetch_max(backlog, Ordering::Relaxed);
        backlog
    }

    pub(crate) fn dequeued(&self) {
        // saturate: a racing enqueue may not have been counted yet
        let _ = self
            .queued
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Count one write attempt; failures keep their message
    pub(crate) fn record_write(&self, outcome: &Result<(), ContractError>) {
        match outcome {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                *self
                    .last_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
            }
        }
        observability::record_sink_write(&self.sink, outcome.is_ok());
    }

    /// Count an error that never reached the sink
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_sink_dropped(&self.sink);
    }

    /// Message of the most recent failed write
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queued.load(Ordering::Relaxed),
            peak_queue_len: self.peak.load(Ordering::Relaxed),
            write_count: self.written.load(Ordering::Relaxed),
            failure_count: self.failed.load(Ordering::Relaxed),
            dropped_count: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    /// Longest backlog seen so far
    pub peak_queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Errors handed to the sink, whatever the outcome
    pub fn attempted(&self) -> u64 {
        self.write_count + self.failure_count
    }
}
