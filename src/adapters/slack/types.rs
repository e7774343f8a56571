//! Slack wire types
//!
//! Serde mappings for the Web API envelopes and the RTM event stream. Only
//! the fields the normalizer consumes are declared; everything else in the
//! payload is ignored.

use serde::Deserialize;

/// Response envelope for `rtm.connect`.
#[derive(Debug, Deserialize)]
pub struct RtmConnectResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "self")]
    pub self_info: Option<RtmSelf>,
    pub team: Option<RtmTeam>,
}

/// The bot's own identity from `rtm.connect`.
#[derive(Debug, Deserialize)]
pub struct RtmSelf {
    pub id: String,
    pub name: String,
}

/// Workspace info from `rtm.connect` / `team.info`.
#[derive(Debug, Clone, Deserialize)]
pub struct RtmTeam {
    pub id: String,
    pub name: String,
}

/// An event frame off the RTM socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RtmEvent {
    /// Stream is fully open
    Hello,
    /// Server is about to close the stream
    Goodbye,
    Message(RtmMessage),
    /// Any event type the bot does not consume
    #[serde(other)]
    Other,
}

/// A `message` event. Subtyped variants (edits, joins, topic changes) carry
/// `subtype` and are dropped by the normalizer.
#[derive(Debug, Clone, Deserialize)]
pub struct RtmMessage {
    pub subtype: Option<String>,
    pub user: Option<String>,
    pub text: Option<String>,
    /// Epoch seconds with a fractional uniqueness suffix, as a string
    pub ts: Option<String>,
    pub channel: Option<String>,
    /// Present on bot-authored messages
    pub bot_id: Option<String>,
    pub user_profile: Option<SlackUserProfile>,
}

/// Denormalized sender info attached to some message events.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackUserProfile {
    pub name: Option<String>,
    pub real_name: Option<String>,
}

/// A member record from `users.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub profile: SlackProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackProfile {
    pub real_name_normalized: Option<String>,
}

/// A conversation record from `conversations.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_im: bool,
    /// DM counterpart's user id, present when `is_im`
    pub user: Option<String>,
}

/// Response envelope for `users.list`.
#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

/// Response envelope for `conversations.list`.
#[derive(Debug, Deserialize)]
pub struct ConversationsListResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub channels: Vec<SlackChannel>,
}

/// Response envelope for `team.info`.
#[derive(Debug, Deserialize)]
pub struct TeamInfoResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub team: Option<RtmTeam>,
}

/// Response envelope for `chat.postMessage`.
#[derive(Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_deserializes() {
        let json = r#"{
            "type": "message",
            "user": "U024BE7LH",
            "text": "Hello world",
            "ts": "1355517523.000005",
            "channel": "C024BE91L"
        }"#;
        let event: RtmEvent = serde_json::from_str(json).unwrap();
        match event {
            RtmEvent::Message(msg) => {
                assert_eq!(msg.user.as_deref(), Some("U024BE7LH"));
                assert_eq!(msg.ts.as_deref(), Some("1355517523.000005"));
                assert_eq!(msg.subtype, None);
                assert_eq!(msg.bot_id, None);
            }
            other => panic!("expected message event, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_types_fold_into_other() {
        let event: RtmEvent =
            serde_json::from_str(r#"{"type":"user_typing","channel":"C1","user":"U1"}"#).unwrap();
        assert!(matches!(event, RtmEvent::Other));

        let event: RtmEvent = serde_json::from_str(r#"{"type":"hello"}"#).unwrap();
        assert!(matches!(event, RtmEvent::Hello));
    }

    #[test]
    fn test_connect_error_envelope() {
        let resp: RtmConnectResponse =
            serde_json::from_str(r#"{"ok":false,"error":"invalid_auth"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("invalid_auth"));
        assert!(resp.url.is_none());
    }
}
