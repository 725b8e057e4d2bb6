//! LogSink - mirrors errors into the tracing log

use contracts::{ContractError, ErrorSink, ErrorValue};
use tracing::{error, info, instrument};

/// Sink that emits every error as a tracing event
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_error(&self, value: &ErrorValue) {
        match value.report() {
            Some(report) => error!(
                sink = %self.name,
                error = %report.message,
                kind = report.kind.as_deref().unwrap_or("unknown"),
                causes = ?report.chain,
                location = report.location.as_deref().unwrap_or(""),
                "Error funneled"
            ),
            None => error!(sink = %self.name, error = %value, "Error funneled"),
        }
    }
}

impl ErrorSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, error), fields(sink = %self.name))]
    async fn write(&mut self, error: &ErrorValue) -> Result<(), ContractError> {
        self.log_error(error);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ErrorReport;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");

        assert!(sink.write(&ErrorValue::from("plain")).await.is_ok());

        let report = ErrorReport::new("structured").with_cause("inner");
        assert!(sink.write(&ErrorValue::from(report)).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
