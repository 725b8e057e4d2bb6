//! SinkHandle - runs a sink behind an isolated queue and worker task
//!
//! The listener side never blocks: errors are queued with an unbounded send
//! and written by the worker in arrival order. Nothing is dropped while the
//! worker is alive; a backlog past the warning level is only logged.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ErrorSink, ErrorValue, Listener};

use crate::metrics::SinkMetrics;

enum Command {
    Write(ErrorValue),
    Shutdown,
}

/// Cloneable producer side of a sink worker
#[derive(Clone)]
pub struct SinkSender {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Command>,
    metrics: Arc<SinkMetrics>,
    backlog_warning: usize,
}

impl SinkSender {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an error for the sink (non-blocking, fire-and-forget).
    ///
    /// Returns itself so repeated calls can be chained.
    pub fn send(&self, error: &ErrorValue) -> &Self {
        // count before sending so the worker never sees a negative backlog
        let backlog = self.metrics.enqueued();
        if self.tx.send(Command::Write(error.clone())).is_err() {
            self.metrics.dequeued();
            self.metrics.record_dropped();
            debug!(sink = %self.name, "Sink worker closed, error dropped");
            return self;
        }
        if backlog == self.backlog_warning {
            warn!(
                sink = %self.name,
                backlog,
                "Sink is falling behind, errors are piling up"
            );
        }
        self
    }
}

/// Handle to a running sink worker
pub struct SinkHandle {
    sender: SinkSender,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    ///
    /// `backlog_warning` is the queue length that triggers a warning; it
    /// never limits the queue. Must be called from within a Tokio runtime.
    pub fn spawn<S: ErrorSink + Send + 'static>(sink: S, backlog_warning: usize) -> Self {
        let name: Arc<str> = Arc::from(sink.name());
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(SinkMetrics::new(Arc::clone(&name)));

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.to_string();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            sender: SinkSender {
                name,
                tx,
                metrics,
                backlog_warning: backlog_warning.max(1),
            },
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        self.sender.name()
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.sender.metrics
    }

    pub fn sender(&self) -> &SinkSender {
        &self.sender
    }

    /// Queue an error for the sink
    pub fn send(&self, error: &ErrorValue) -> &Self {
        self.sender.send(error);
        self
    }

    /// A listener that queues every error it receives for this sink
    pub fn listener(&self) -> Listener {
        let sender = self.sender.clone();
        Arc::new(move |error: &ErrorValue| {
            sender.send(error);
        })
    }

    /// Drain the queue, then flush and close the sink
    ///
    /// Errors queued before this call are written; later ones are dropped.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name()))]
    pub async fn shutdown(self) {
        if self.sender.tx.send(Command::Shutdown).is_err() {
            debug!(sink = %self.sender.name, "Sink worker already stopped");
        }
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.sender.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.sender.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes errors and writes them to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: ErrorSink>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<Command>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(command) = rx.recv().await {
        let value = match command {
            Command::Write(value) => value,
            Command::Shutdown => break,
        };
        metrics.dequeued();

        let outcome = sink.write(&value).await;
        metrics.record_write(&outcome);
        if let Err(e) = outcome {
            error!(sink = %name, error = %e, "Write failed");
        }
    }

    // errors that raced in behind the shutdown command
    rx.close();
    while let Ok(command) = rx.try_recv() {
        if let Command::Write(_) = command {
            metrics.dequeued();
            metrics.record_dropped();
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
