//! Channel types for chat platforms

use serde::{Deserialize, Serialize};

/// A channel or direct-message conversation in the session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Opaque platform channel id
    pub id: String,
    /// Display name; DM channels are named `#<recipient-handle>`
    pub name: String,
    /// Kind of conversation
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

/// Kind of conversation.
///
/// Voice channels never make it into a directory; platform kinds with no
/// canonical equivalent (category, group DM) pass through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelKind {
    /// Regular text channel
    Channel,
    /// Direct message conversation
    Dm,
    /// Platform-specific kind passed through verbatim
    Other(String),
}

impl ChannelKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChannelKind::Channel => "channel",
            ChannelKind::Dm => "dm",
            ChannelKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ChannelKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "channel" => ChannelKind::Channel,
            "dm" => ChannelKind::Dm,
            _ => ChannelKind::Other(s),
        }
    }
}

impl From<ChannelKind> for String {
    fn from(kind: ChannelKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Channel {
    /// Create a new channel
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Channel {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Check if this is a direct message conversation
    pub fn is_dm(&self) -> bool {
        self.kind == ChannelKind::Dm
    }
}
