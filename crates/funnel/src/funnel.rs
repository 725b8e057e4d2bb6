//! Funnel - the single typed surface applications talk to

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{
    ErrorEmitter, ErrorSink, ErrorValue, FunnelConfig, Listener, MailTransport, Recipients, Topic,
};

use crate::channel::DispatchChannel;
use crate::error::FunnelError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{EmailSink, FileSink, LogSink};
use crate::title::Title;
use crate::unwind;
use crate::wrap::Guarded;

/// Default backlog warning level of every sink worker
pub const DEFAULT_BACKLOG_WARNING: usize = 100;

struct FunnelInner {
    channel: DispatchChannel,
    title: Title,
    backlog_warning: usize,
    sinks: Mutex<Vec<SinkHandle>>,
}

/// Cheaply cloneable handle to one error funnel.
///
/// Construct it once in the application's composition root and pass clones
/// to everything that raises or subscribes.
#[derive(Clone)]
pub struct Funnel {
    inner: Arc<FunnelInner>,
}

impl Funnel {
    pub fn new() -> Self {
        Self::with_backlog_warning(DEFAULT_BACKLOG_WARNING)
    }

    /// Create a funnel whose sink workers warn once `backlog_warning` errors are waiting
    pub fn with_backlog_warning(backlog_warning: usize) -> Self {
        Self {
            inner: Arc::new(FunnelInner {
                channel: DispatchChannel::new(),
                title: Title::new(),
                backlog_warning: backlog_warning.max(1),
                sinks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build a funnel and subscribe the sinks described by `config`.
    ///
    /// Sinks are registered in a fixed order: tracing, file, email.
    /// Must be called from within a Tokio runtime when any sink is configured.
    #[instrument(name = "funnel_from_config", skip(config))]
    pub fn from_config(config: &FunnelConfig) -> Result<Self, FunnelError> {
        let funnel = Self::with_backlog_warning(config.backlog_warning);
        funnel.set_title(config.title.clone());

        if config.trace {
            let listener = funnel.attach(LogSink::new("trace"))?;
            funnel.on(Topic::ERROR, listener);
        }

        if let Some(log) = &config.log {
            let listener = funnel.log(&log.path)?;
            funnel.on(Topic::ERROR, listener);
        }

        if let Some(notify) = &config.notify {
            let listener = funnel.notify_from_config(notify)?;
            funnel.on(Topic::ERROR, listener);
        }

        info!(
            listeners = funnel.listener_count(Topic::ERROR),
            title = ?config.title,
            "Funnel configured"
        );
        Ok(funnel)
    }

    #[cfg(feature = "smtp")]
    fn notify_from_config(&self, notify: &contracts::NotifyConfig) -> Result<Listener, FunnelError> {
        self.notify(notify.recipients.clone(), notify.mail.clone())
    }

    #[cfg(not(feature = "smtp"))]
    fn notify_from_config(&self, notify: &contracts::NotifyConfig) -> Result<Listener, FunnelError> {
        Err(FunnelError::sink_creation(
            format!("email:{}", notify.recipients.as_slice().join(",")),
            "built without the `smtp` feature",
        ))
    }

    /// The underlying dispatch channel
    pub fn channel(&self) -> &DispatchChannel {
        &self.inner.channel
    }

    /// Register `listener` under `topic`
    pub fn on(&self, topic: impl Into<Topic>, listener: Listener) -> &Self {
        self.inner.channel.on(topic, listener);
        self
    }

    /// Remove a registration; unknown listeners are ignored
    pub fn off(&self, topic: impl Into<Topic>, listener: &Listener) -> &Self {
        self.inner.channel.off(topic, listener);
        self
    }

    /// Publish `value` on any topic
    pub fn emit(&self, topic: impl Into<Topic>, value: impl Into<ErrorValue>) -> &Self {
        self.inner.channel.emit(topic, value);
        self
    }

    /// Publish `value` on the `"error"` topic
    pub fn raise(&self, value: impl Into<ErrorValue>) -> &Self {
        self.inner.channel.raise(value);
        self
    }

    pub fn listener_count(&self, topic: impl Into<Topic>) -> usize {
        self.inner.channel.listener_count(topic)
    }

    /// A listener that re-raises whatever it receives into this funnel.
    ///
    /// Holds a weak reference, so registering it anywhere never keeps the
    /// funnel alive.
    pub fn raiser(&self) -> Listener {
        let inner = Arc::downgrade(&self.inner);
        Arc::new(move |value: &ErrorValue| {
            if let Some(inner) = inner.upgrade() {
                inner.channel.raise(value.clone());
            }
        })
    }

    /// Guard `f`, using this funnel as its context
    pub fn wrap<A, T, E, F>(&self, f: F) -> Guarded<Funnel, F>
    where
        F: Fn(&Funnel, A) -> Result<T, E>,
        E: Into<ErrorValue>,
    {
        Guarded::new(self.clone(), self.clone(), f)
    }

    /// Guard `f`, invoking it with `context`
    pub fn wrap_with<C, A, T, E, F>(&self, context: C, f: F) -> Guarded<C, F>
    where
        F: Fn(&C, A) -> Result<T, E>,
        E: Into<ErrorValue>,
    {
        Guarded::new(self.clone(), context, f)
    }

    /// Run `sink` behind a worker queue owned by this funnel.
    ///
    /// Returns the listener feeding the queue; it is not subscribed.
    pub fn attach<S>(&self, sink: S) -> Result<Listener, FunnelError>
    where
        S: ErrorSink + Send + 'static,
    {
        Handle::try_current().map_err(|_| FunnelError::NoRuntime)?;

        let handle = SinkHandle::spawn(sink, self.inner.backlog_warning);
        let listener = handle.listener();
        debug!(sink = %handle.name(), "Sink attached");
        self.inner
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
        Ok(listener)
    }

    /// File sink: truncate `path`, write the start marker, append every error
    #[instrument(name = "funnel_log", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn log(&self, path: impl AsRef<Path>) -> Result<Listener, FunnelError> {
        Handle::try_current().map_err(|_| FunnelError::NoRuntime)?;

        let path = path.as_ref();
        let sink = FileSink::create(path)
            .map_err(|e| FunnelError::sink_creation(path.display().to_string(), e.to_string()))?;
        self.attach(sink)
    }

    /// Email sink over SMTP.
    ///
    /// Without `config`, the `mail` namespace is loaded through
    /// [`config_loader::ConfigLoader::load_mail`]. The sender is `auth.user`.
    #[cfg(feature = "smtp")]
    #[instrument(name = "funnel_notify", skip_all)]
    pub fn notify(
        &self,
        recipients: impl Into<Recipients>,
        config: Option<contracts::MailConfig>,
    ) -> Result<Listener, FunnelError> {
        let config = match config {
            Some(config) => config,
            None => config_loader::ConfigLoader::load_mail()?,
        };
        let transport = crate::sinks::SmtpMailer::from_config(&config)?;
        self.notify_with(recipients, config.auth.user.clone(), transport)
    }

    /// Email sink over any mail transport
    pub fn notify_with<T>(
        &self,
        recipients: impl Into<Recipients>,
        from: impl Into<String>,
        transport: T,
    ) -> Result<Listener, FunnelError>
    where
        T: MailTransport + Sync + 'static,
    {
        Handle::try_current().map_err(|_| FunnelError::NoRuntime)?;

        let recipients = recipients.into();
        let sink = EmailSink::new(recipients.clone(), from, transport, self.inner.title.clone())
            .map_err(|e| {
                FunnelError::sink_creation(
                    format!("email:{}", recipients.as_slice().join(",")),
                    e.to_string(),
                )
            })?;
        self.attach(sink)
    }

    /// Bridge an external emitter's errors into this funnel
    pub fn catch<E: ErrorEmitter + ?Sized>(&self, emitter: &E) -> &Self {
        emitter.on_error(self.raiser());
        self
    }

    /// Raise everything received on `rx` until all senders are dropped
    pub fn catch_channel<E>(&self, mut rx: mpsc::Receiver<E>) -> Result<JoinHandle<()>, FunnelError>
    where
        E: Into<ErrorValue> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| FunnelError::NoRuntime)?;
        let funnel = self.clone();

        Ok(runtime.spawn(async move {
            while let Some(error) = rx.recv().await {
                funnel.raise(error);
            }
            debug!("Caught channel closed");
        }))
    }

    /// Await a fallible future: `Err` is raised, `Ok` is handed to `on_success`.
    ///
    /// A panic in `on_success` is raised as well.
    pub async fn swear<Fut, T, E, S, R>(&self, future: Fut, on_success: S) -> Option<R>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<ErrorValue>,
        S: FnOnce(T) -> R,
    {
        match future.await {
            Ok(value) => match unwind::capture(|| on_success(value)) {
                Ok(result) => Some(result),
                Err(panic) => {
                    self.raise(panic);
                    None
                }
            },
            Err(error) => {
                self.raise(error);
                None
            }
        }
    }

    /// Set or clear the email subject override
    pub fn set_title(&self, title: Option<String>) -> &Self {
        self.inner.title.set(title);
        self
    }

    pub fn title(&self) -> Option<String> {
        self.inner.title.get()
    }

    /// Metrics of every attached sink
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.inner
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Drain every sink queue, then flush and close the sinks.
    ///
    /// Returns the final metrics of each sink. Listeners stay registered;
    /// errors raised afterwards are dropped by the stopped sinks.
    #[instrument(name = "funnel_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Vec<(String, MetricsSnapshot)> {
        let handles = std::mem::take(
            &mut *self
                .inner
                .sinks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        info!(sinks = handles.len(), "Funnel shutting down");

        let mut finals = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let metrics = Arc::clone(handle.metrics());
            handle.shutdown().await;
            finals.push((name, metrics.snapshot()));
        }

        info!("Funnel shutdown complete");
        finals
    }
}

impl Default for Funnel {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorEmitter for Funnel {
    fn on_error(&self, listener: Listener) {
        self.on(Topic::ERROR, listener);
    }
}

impl std::fmt::Debug for Funnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Funnel")
            .field("channel", &self.inner.channel)
            .field("title", &self.inner.title.get())
            .field("backlog_warning", &self.inner.backlog_warning)
            .finish()
    }
}
