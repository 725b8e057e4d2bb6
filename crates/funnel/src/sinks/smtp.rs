//! SmtpMailer - SMTP mail transport backed by lettre

use contracts::{ContractError, MailConfig, MailMessage, MailTransport};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

/// Mail transport that relays through an SMTP server
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a transport from the `mail` configuration
    ///
    /// `secure = true` uses implicit TLS, otherwise STARTTLS is required.
    /// No connection is made until the first message is sent.
    #[instrument(name = "smtp_mailer_new", skip(config), fields(host = %config.host, port = config.port))]
    pub fn from_config(config: &MailConfig) -> Result<Self, ContractError> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| ContractError::mail_transport(format!("{}: {e}", config.host)))?;

        let mut builder = builder.port(config.port);
        if !config.auth.pass.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.auth.user.clone(),
                config.auth.pass.clone(),
            ));
        }

        debug!(host = %config.host, port = config.port, "SMTP transport configured");
        Ok(Self {
            host: config.host.clone(),
            transport: builder.build(),
        })
    }

    fn build_message(message: &MailMessage) -> Result<Message, ContractError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&message.from)?)
            .subject(message.subject.as_str());
        for to in &message.to {
            builder = builder.to(parse_mailbox(to)?);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| ContractError::mail_transport(format!("cannot build message: {e}")))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, ContractError> {
    address
        .parse()
        .map_err(|_| ContractError::invalid_address(address))
}

impl MailTransport for SmtpMailer {
    async fn send_mail(&self, message: &MailMessage) -> Result<(), ContractError> {
        let email = Self::build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| ContractError::mail_transport(format!("{}: {e}", self.host)))?;
        Ok(())
    }
}
