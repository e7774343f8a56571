//! Canonical message and attachment types

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::types::User;

/// Placeholder rendered for a rich attachment that carries no plain-text
/// fallback of its own.
pub const DEFAULT_FALLBACK: &str = "NO FALLBACK DEFINED";

/// A platform-independent chat message.
///
/// Only constructed for human-authored events: the adapter normalizers
/// filter bot-authored traffic before a `Message` ever exists. Optional
/// fields are omitted from serialized output entirely, so presence carries
/// meaning downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque platform id of the sender
    pub user: String,
    /// Message body
    pub text: String,
    /// Numeric epoch timestamp. Seconds (fractional) on Slack, milliseconds
    /// on Discord; stable as a sort/format key within one adapter.
    pub timestamp: f64,
    /// Where the message arrived; also the reply destination
    pub channel_or_dm_id: String,
    /// 12-hour `h:mm a` rendering of the timestamp, computed once at
    /// normalization time
    pub friendly_timestamp: String,
    /// Denormalized sender info some platforms attach to bot-ish system
    /// messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<User>,
}

impl Message {
    /// Build a message from an epoch-seconds timestamp (Slack `ts`).
    pub fn at_seconds(
        user: impl Into<String>,
        text: impl Into<String>,
        epoch_secs: f64,
        channel_or_dm_id: impl Into<String>,
    ) -> Self {
        Message {
            user: user.into(),
            text: text.into(),
            timestamp: epoch_secs,
            channel_or_dm_id: channel_or_dm_id.into(),
            friendly_timestamp: friendly_timestamp(epoch_secs, &Local),
            user_profile: None,
        }
    }

    /// Build a message from an epoch-milliseconds timestamp (Discord).
    /// The canonical `timestamp` keeps the millisecond unit; only the
    /// friendly rendering converts to seconds.
    pub fn at_millis(
        user: impl Into<String>,
        text: impl Into<String>,
        epoch_ms: i64,
        channel_or_dm_id: impl Into<String>,
    ) -> Self {
        Message {
            user: user.into(),
            text: text.into(),
            timestamp: epoch_ms as f64,
            channel_or_dm_id: channel_or_dm_id.into(),
            friendly_timestamp: friendly_timestamp(epoch_ms as f64 / 1000.0, &Local),
            user_profile: None,
        }
    }

    /// Attach denormalized sender info
    pub fn with_user_profile(mut self, profile: User) -> Self {
        self.user_profile = Some(profile);
        self
    }
}

/// Render an epoch-seconds timestamp as a 12-hour `h:mm a` string
/// ("10:13 pm") in the given timezone. The adapters pass `Local`; tests pin
/// `Utc` for determinism.
pub fn friendly_timestamp<Tz: TimeZone>(epoch_secs: f64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_opt(epoch_secs.trunc() as i64, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%-I:%M %P").to_string(),
        _ => String::new(),
    }
}

/// A rich outbound attachment for `send_custom`.
///
/// Each adapter maps these onto its platform's native structure; platforms
/// that cannot render them fall back to `fallback_text()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Plain-text rendering used when rich display is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Attachment {
    /// Create an empty attachment
    pub fn new() -> Self {
        Attachment::default()
    }

    /// Set the plain-text fallback
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the body text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the accent color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set an image URL
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// The plain-text rendering, defaulting to [`DEFAULT_FALLBACK`].
    pub fn fallback_text(&self) -> &str {
        self.fallback.as_deref().unwrap_or(DEFAULT_FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_friendly_timestamp_is_deterministic() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(friendly_timestamp(1_700_000_000.0, &Utc), "10:13 pm");
        // Fractional seconds are truncated, not rounded
        assert_eq!(friendly_timestamp(1_700_000_000.999, &Utc), "10:13 pm");
        // Morning hours render without a leading zero
        assert_eq!(friendly_timestamp(1_700_034_180.0, &Utc), "7:43 am");
    }

    #[test]
    fn test_friendly_timestamp_renders_in_any_timezone() {
        // Local output varies by host timezone; the shape does not
        let rendered = friendly_timestamp(1_700_000_000.0, &Local);
        assert!(rendered.contains(':'));
        assert!(rendered.ends_with("am") || rendered.ends_with("pm"));
    }

    #[test]
    fn test_millis_constructor_converts_for_friendly_rendering() {
        let from_ms = Message::at_millis("1099", "hi", 1_700_000_000_000, "C1");
        let from_s = Message::at_seconds("1099", "hi", 1_700_000_000.0, "C1");
        assert_eq!(from_ms.friendly_timestamp, from_s.friendly_timestamp);
        // The sort key keeps the platform-native unit
        assert_eq!(from_ms.timestamp, 1_700_000_000_000.0);
    }

    #[test]
    fn test_absent_profile_is_omitted_from_serialization() {
        let msg = Message::at_seconds("U1", "hello", 1_700_000_000.0, "C1");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("user_profile"));

        let msg = msg.with_user_profile(User::from_handle("U2", "teddy"));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("user_profile"));
    }

    #[test]
    fn test_attachment_fallback_default() {
        let plain = Attachment::new();
        assert_eq!(plain.fallback_text(), DEFAULT_FALLBACK);

        let custom = Attachment::new().with_fallback("a gif of a cat");
        assert_eq!(custom.fallback_text(), "a gif of a cat");
    }
}
