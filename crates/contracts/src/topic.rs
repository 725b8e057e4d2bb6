//! Topic - publish/subscribe channel key

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Stable string key identifying a publish/subscribe channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    /// Reserved primary topic carrying all funnel traffic
    pub const ERROR: Topic = Topic(Cow::Borrowed("error"));

    /// Create a topic from a static name
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved `"error"` topic
    pub fn is_error(&self) -> bool {
        self.as_str() == Self::ERROR.as_str()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Copies the name; use [`Topic::from_static`] for literals known at compile time
impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(name.to_string()))
    }
}

impl From<&String> for Topic {
    fn from(name: &String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
