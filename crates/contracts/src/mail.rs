//! Mail contracts - message, transport and account configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidateEmail;

use crate::ContractError;

/// One outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail transport trait
///
/// Dispatches one email; the wire protocol (SMTP, HTTP API, ...) is opaque
/// to the funnel.
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    /// Send a message
    ///
    /// # Errors
    /// Returns transport error (connection, rejection, ...)
    async fn send_mail(&self, message: &MailMessage) -> Result<(), ContractError>;
}

/// Ordered, non-empty list of recipient addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct Recipients(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Recipients {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(address) => Self(vec![address]),
            OneOrMany::Many(addresses) => Self(addresses),
        }
    }
}

impl Recipients {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the list is non-empty and every address is well-formed
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.0.is_empty() {
            return Err(ContractError::config_validation(
                "recipients",
                "at least one recipient is required",
            ));
        }
        for address in &self.0 {
            if !address.as_str().validate_email() {
                return Err(ContractError::invalid_address(address));
            }
        }
        Ok(())
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Self(addresses.iter().map(|a| a.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Self(addresses.iter().map(|a| a.to_string()).collect())
    }
}

/// Mail account configuration (the `mail` namespace)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host
    #[serde(default = "default_mail_host")]
    pub host: String,

    /// SMTP relay port
    #[serde(default = "default_mail_port")]
    pub port: u16,

    /// Use implicit TLS instead of STARTTLS
    #[serde(default)]
    pub secure: bool,

    /// Sending account
    pub auth: MailAuth,
}

fn default_mail_host() -> String {
    "localhost".to_string()
}

fn default_mail_port() -> u16 {
    587
}

/// Sending account credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAuth {
    /// Account identity, also used as the `from` address
    pub user: String,

    #[serde(default)]
    pub pass: String,
}

impl fmt::Debug for MailAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailAuth")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

impl MailConfig {
    /// Config for the given account with default host and port
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            host: default_mail_host(),
            port: default_mail_port(),
            secure: false,
            auth: MailAuth {
                user: user.into(),
                pass: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_address_becomes_list() {
        let recipients = Recipients::from("ops@example.com");
        assert_eq!(recipients.as_slice(), &["ops@example.com".to_string()]);
    }

    #[test]
    fn test_deserialize_one_or_many() {
        let one: Recipients = serde_json::from_str(r#""a@x.com""#).unwrap();
        let many: Recipients = serde_json::from_str(r#"["a@x.com", "b@x.com"]"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(many.to_vec(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_validate_rejects_empty_and_malformed() {
        assert!(Recipients::from(Vec::new()).validate().is_err());

        let err = Recipients::from(["a@x.com", "not-an-address"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAddress { .. }));

        assert!(Recipients::from(["a@x.com"]).validate().is_ok());
    }

    #[test]
    fn test_mail_config_defaults() {
        let config: MailConfig = serde_json::from_str(r#"{"auth": {"user": "bot@x.com"}}"#).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 587);
        assert!(!config.secure);
        assert_eq!(config, MailConfig::for_user("bot@x.com"));
    }

    #[test]
    fn test_auth_debug_redacts_password() {
        let mut config = MailConfig::for_user("bot@x.com");
        config.auth.pass = "hunter2".into();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("bot@x.com"));
    }
}
