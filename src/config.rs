//! TOML configuration
//!
//! One config file describes every team the bot joins: which platform
//! adapter to run, its credential material, the command prefix, and the
//! per-team tuning knobs.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration: one `[[teams]]` table per adapter instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub teams: Vec<TeamConfig>,
}

/// Configuration for a single adapter instance.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    /// Which platform adapter to run
    pub adapter: AdapterKind,
    /// Credential material; key names are adapter-specific ("token")
    pub auth: HashMap<String, String>,
    /// Leading character that marks a command ("!"); commands are
    /// disabled for the team when absent
    pub command_prefix: Option<char>,
    /// Tuning knobs, all defaulted
    #[serde(default)]
    pub settings: Settings,
}

/// Supported platform adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Slack,
    Discord,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Slack => "slack",
            AdapterKind::Discord => "discord",
        }
    }
}

/// How directory loads are issued against the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    /// One request at a time
    Sequential,
    /// All requests in flight at once
    Burst,
}

/// Per-team tuning knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Page through full member lists at startup (Discord)
    pub fetch_all_members: bool,
    /// Pacing for directory loads
    pub request_method: RequestMethod,
    /// Capacity of the inbound event queue
    pub message_cache_max_size: usize,
    /// Seconds before queued events would be discarded; recognized but
    /// not currently enforced (0 means unbounded)
    pub message_cache_lifetime: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fetch_all_members: false,
            request_method: RequestMethod::Sequential,
            message_cache_max_size: 200,
            message_cache_lifetime: 0,
        }
    }
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_str(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| Error::config(format!("invalid config: {}", e)))
    }

    /// Load and parse a config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!("could not read {}: {}", path.display(), e))
        })?;
        Config::from_str(&text)
    }
}

impl TeamConfig {
    /// Fetch a required credential by key.
    pub fn credential(&self, key: &str) -> Result<&str> {
        self.auth
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::config(format!("missing auth key \"{}\"", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_team() {
        let config = Config::from_str(
            r#"
            [[teams]]
            adapter = "slack"
            auth = { token = "xoxb-123" }
            "#,
        )
        .unwrap();

        let team = &config.teams[0];
        assert_eq!(team.adapter, AdapterKind::Slack);
        assert_eq!(team.credential("token").unwrap(), "xoxb-123");
        assert_eq!(team.command_prefix, None);
        assert!(!team.settings.fetch_all_members);
        assert_eq!(team.settings.request_method, RequestMethod::Sequential);
        assert_eq!(team.settings.message_cache_max_size, 200);
        assert_eq!(team.settings.message_cache_lifetime, 0);
    }

    #[test]
    fn test_parse_full_team() {
        let config = Config::from_str(
            r#"
            [[teams]]
            adapter = "discord"
            command_prefix = "!"

            [teams.auth]
            token = "Njk4..."

            [teams.settings]
            fetch_all_members = true
            request_method = "burst"
            message_cache_max_size = 500
            "#,
        )
        .unwrap();

        let team = &config.teams[0];
        assert_eq!(team.adapter, AdapterKind::Discord);
        assert_eq!(team.command_prefix, Some('!'));
        assert!(team.settings.fetch_all_members);
        assert_eq!(team.settings.request_method, RequestMethod::Burst);
        assert_eq!(team.settings.message_cache_max_size, 500);
        // Unset knobs keep their defaults
        assert_eq!(team.settings.message_cache_lifetime, 0);
    }

    #[test]
    fn test_missing_credential_is_a_config_error() {
        let config = Config::from_str(
            r#"
            [[teams]]
            adapter = "slack"
            auth = {}
            "#,
        )
        .unwrap();

        let err = config.teams[0].credential("token").unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_unknown_adapter_is_rejected() {
        let result = Config::from_str(
            r#"
            [[teams]]
            adapter = "irc"
            auth = { token = "t" }
            "#,
        );
        assert!(result.is_err());
    }
}
