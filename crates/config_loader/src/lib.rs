//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON funnel configuration files
//! - Resolve named configuration namespaces (`mail`) from layered rc sources
//! - Validate configuration legality
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("sluice.toml")).unwrap();
//! println!("backlog warning: {}", config.backlog_warning);
//!
//! let mail = ConfigLoader::load_mail().unwrap();
//! println!("sending as: {}", mail.auth.user);
//! ```

mod namespace;
mod parser;
mod validator;

pub use contracts::FunnelConfig;
pub use namespace::{default_sources, ConfigSource};
pub use parser::ConfigFormat;

use contracts::{ContractError, MailConfig};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Reserved namespace for mail transport configuration
pub const MAIL_NAMESPACE: &str = "mail";

/// Configuration loader
///
/// Provides static methods to load configuration from files, strings or
/// namespaced rc sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<FunnelConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FunnelConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Load a configuration namespace from the default rc sources
    ///
    /// See [`default_sources`] for the lookup order.
    ///
    /// # Errors
    /// - No source defines the namespace
    /// - A source cannot be parsed
    /// - The merged table does not match `T`
    pub fn load_namespace<T: DeserializeOwned>(namespace: &str) -> Result<T, ContractError> {
        Self::load_namespace_from(namespace, &default_sources(namespace))
    }

    /// Load a configuration namespace from explicit sources
    pub fn load_namespace_from<T: DeserializeOwned>(
        namespace: &str,
        sources: &[ConfigSource],
    ) -> Result<T, ContractError> {
        let table = namespace::resolve(namespace, sources)?;
        if table.is_empty() {
            return Err(ContractError::config_not_found(
                namespace,
                format!("no rc file or '{namespace}_*' environment variable found"),
            ));
        }
        debug!(namespace, keys = table.len(), "Config namespace resolved");

        toml::Value::Table(table)
            .try_into()
            .map_err(|e| {
                ContractError::config_parse_caused(format!("namespace '{namespace}': {e}"), e)
            })
    }

    /// Load and validate the `mail` namespace
    pub fn load_mail() -> Result<MailConfig, ContractError> {
        Self::load_mail_from(&default_sources(MAIL_NAMESPACE))
    }

    /// Load and validate the `mail` namespace from explicit sources
    pub fn load_mail_from(sources: &[ConfigSource]) -> Result<MailConfig, ContractError> {
        let mail: MailConfig = Self::load_namespace_from(MAIL_NAMESPACE, sources)?;
        validator::validate_mail(&mail)?;
        Ok(mail)
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FunnelConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
