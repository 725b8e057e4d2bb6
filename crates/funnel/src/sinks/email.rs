//! EmailSink - one email per error through a pluggable transport

use contracts::{ContractError, ErrorSink, ErrorValue, MailMessage, MailTransport, Recipients};
use tracing::{debug, instrument};

use crate::normalize::{escape_html, render};
use crate::title::Title;

/// Sink that mails every error to a fixed recipient list
pub struct EmailSink<T> {
    name: String,
    recipients: Recipients,
    from: String,
    title: Title,
    transport: T,
}

impl<T: MailTransport> EmailSink<T> {
    /// Create an email sink
    ///
    /// # Errors
    /// Empty recipient list or malformed address
    pub fn new(
        recipients: impl Into<Recipients>,
        from: impl Into<String>,
        transport: T,
        title: Title,
    ) -> Result<Self, ContractError> {
        let recipients = recipients.into();
        recipients.validate()?;

        Ok(Self {
            name: format!("email:{}", recipients.as_slice().join(",")),
            recipients,
            from: from.into(),
            title,
            transport,
        })
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    /// Build the message sent for `error`
    pub fn message(&self, error: &ErrorValue) -> MailMessage {
        let text = render(error);
        MailMessage {
            to: self.recipients.to_vec(),
            from: self.from.clone(),
            subject: self.title.get().unwrap_or_else(|| error.to_string()),
            html: format!("<code><pre>{}</pre></code>", escape_html(&text)),
            text,
        }
    }
}

impl<T: MailTransport + Sync> ErrorSink for EmailSink<T> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "email_sink_write", skip(self, error), fields(sink = %self.name))]
    async fn write(&mut self, error: &ErrorValue) -> Result<(), ContractError> {
        let message = self.message(error);
        self.transport
            .send_mail(&message)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, recipients = message.to.len(), "Notification sent");
        Ok(())
    }

    #[instrument(name = "email_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Every message is sent immediately
        Ok(())
    }

    #[instrument(name = "email_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "EmailSink closed");
        Ok(())
    }
}
