//! Discord wire types
//!
//! Serde mappings for gateway frames and the REST objects the directory
//! loaders consume. Gateway payloads arrive as an opcode envelope with an
//! untyped `d` field; dispatch events are decoded a second time once the
//! event name is known.

use serde::{Deserialize, Serialize};

/// Gateway opcodes the adapter handles.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Gateway intent bits the bot identifies with.
pub mod intents {
    pub const GUILDS: u64 = 1 << 0;
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    pub const DIRECT_MESSAGES: u64 = 1 << 12;
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    pub const ALL: u64 = GUILDS | GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT;
}

/// Channel type discriminators from the REST API.
pub mod channel_type {
    pub const GUILD_TEXT: u8 = 0;
    pub const DM: u8 = 1;
    pub const GUILD_VOICE: u8 = 2;
    pub const GROUP_DM: u8 = 3;
    pub const GUILD_CATEGORY: u8 = 4;
}

/// One frame off the gateway socket.
#[derive(Debug, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default)]
    pub d: serde_json::Value,
    /// Sequence number, echoed back in heartbeats
    pub s: Option<u64>,
    /// Dispatch event name, present when `op` is 0
    pub t: Option<String>,
}

/// `d` payload of a Hello frame.
#[derive(Debug, Deserialize)]
pub struct HelloData {
    pub heartbeat_interval: u64,
}

/// `d` payload of a READY dispatch.
#[derive(Debug, Deserialize)]
pub struct ReadyData {
    pub user: DiscordUser,
}

/// `d` payload of a MESSAGE_CREATE dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author: DiscordUser,
    pub content: String,
    /// RFC 3339 creation time
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
    /// Server-agnostic display name, absent for older accounts
    pub global_name: Option<String>,
}

/// A guild from `/users/@me/guilds`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordGuild {
    pub id: String,
    pub name: String,
}

/// A channel from `/guilds/{id}/channels`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: Option<String>,
    /// DM counterparts, present on direct and group channels
    pub recipients: Option<Vec<DiscordUser>>,
}

/// A guild member from `/guilds/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMember {
    pub user: Option<DiscordUser>,
    pub nick: Option<String>,
}

/// The Identify payload sent after Hello.
#[derive(Debug, Serialize)]
pub struct Identify<'a> {
    pub op: u8,
    pub d: IdentifyData<'a>,
}

#[derive(Debug, Serialize)]
pub struct IdentifyData<'a> {
    pub token: &'a str,
    pub intents: u64,
    pub properties: IdentifyProperties,
}

#[derive(Debug, Serialize)]
pub struct IdentifyProperties {
    pub os: &'static str,
    pub browser: &'static str,
    pub device: &'static str,
}

impl<'a> Identify<'a> {
    pub fn new(token: &'a str) -> Self {
        Identify {
            op: opcode::IDENTIFY,
            d: IdentifyData {
                token,
                intents: intents::ALL,
                properties: IdentifyProperties {
                    os: std::env::consts::OS,
                    browser: "crosstalk",
                    device: "crosstalk",
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_frame_decodes_hello() {
        let json = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        let frame: GatewayFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.op, opcode::HELLO);
        let hello: HelloData = serde_json::from_value(frame.d).unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }

    #[test]
    fn test_gateway_frame_decodes_message_create() {
        let json = r#"{
            "op": 0,
            "s": 42,
            "t": "MESSAGE_CREATE",
            "d": {
                "id": "334",
                "channel_id": "199737254929760256",
                "author": {"id": "53908099506183680", "username": "mason", "bot": false},
                "content": "Supa Hot",
                "timestamp": "2017-07-11T17:27:07.299000+00:00"
            }
        }"#;
        let frame: GatewayFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.op, opcode::DISPATCH);
        assert_eq!(frame.t.as_deref(), Some("MESSAGE_CREATE"));
        assert_eq!(frame.s, Some(42));

        let msg: DiscordMessage = serde_json::from_value(frame.d).unwrap();
        assert_eq!(msg.author.username, "mason");
        assert!(!msg.author.bot);
    }

    #[test]
    fn test_identify_serializes_intents() {
        let identify = Identify::new("Njk4...");
        let json = serde_json::to_value(&identify).unwrap();
        assert_eq!(json["op"], 2);
        assert_eq!(json["d"]["token"], "Njk4...");
        assert_eq!(json["d"]["intents"], serde_json::json!(intents::ALL));
    }
}
