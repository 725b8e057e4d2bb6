//! FunnelConfig - Config Loader output
//!
//! Describes a funnel setup: email title, sink queues and output routing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{MailConfig, Recipients};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete funnel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Email subject override (None = stringified error)
    #[serde(default)]
    pub title: Option<String>,

    /// Backlog length at which a sink worker logs a warning
    #[serde(default = "default_backlog_warning")]
    pub backlog_warning: usize,

    /// Mirror every error into the tracing log
    #[serde(default = "default_true")]
    pub trace: bool,

    /// File sink
    #[serde(default)]
    pub log: Option<FileSinkConfig>,

    /// Email sink
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            title: None,
            backlog_warning: default_backlog_warning(),
            trace: true,
            log: None,
            notify: None,
        }
    }
}

fn default_backlog_warning() -> usize {
    100
}

fn default_true() -> bool {
    true
}

/// File sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// Log file, truncated on startup
    pub path: PathBuf,
}

/// Email sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// One address or a list of addresses
    pub recipients: Recipients,

    /// Inline account config (None = load the `mail` namespace)
    #[serde(default)]
    pub mail: Option<MailConfig>,
}
