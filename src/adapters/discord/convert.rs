//! Discord wire-to-canonical conversion

use chrono::DateTime;

use super::types::{channel_type, DiscordChannel, DiscordMember, DiscordMessage, DiscordUser};
use crate::types::{Channel, ChannelKind, Message, User};

/// Convert a user record. The display name prefers the account-wide
/// display name and falls back to the username.
pub fn convert_user(user: DiscordUser) -> User {
    match user.global_name.filter(|n| !n.is_empty()) {
        Some(name) => User::new(user.id, user.username, name),
        None => User::from_handle(user.id, user.username),
    }
}

/// Convert a guild member record. A guild nickname wins over the account
/// display name; members with no user record (rare partial payloads) are
/// dropped.
pub fn convert_member(member: DiscordMember) -> Option<User> {
    let user = member.user?;
    match member.nick.filter(|n| !n.is_empty()) {
        Some(nick) => Some(User::new(user.id, user.username, nick)),
        None => Some(convert_user(user)),
    }
}

/// Convert a channel record. Voice channels are dropped; DMs are named
/// after their first recipient; group DMs and categories pass through with
/// their platform kind.
pub fn convert_channel(channel: DiscordChannel) -> Option<Channel> {
    match channel.kind {
        channel_type::GUILD_TEXT => {
            let name = channel.name.unwrap_or_default();
            Some(Channel::new(
                channel.id,
                format!("#{name}"),
                ChannelKind::Channel,
            ))
        }
        channel_type::DM => {
            let recipient = channel
                .recipients
                .as_deref()
                .and_then(|r| r.first())
                .map(|u| u.username.as_str())
                .unwrap_or("Unknown");
            Some(Channel::new(
                channel.id.clone(),
                format!("#{recipient}"),
                ChannelKind::Dm,
            ))
        }
        channel_type::GUILD_VOICE => None,
        channel_type::GROUP_DM => {
            let name = channel.name.unwrap_or_else(|| "Unknown".to_string());
            Some(Channel::new(
                channel.id,
                format!("#{name}"),
                ChannelKind::Other("group".to_string()),
            ))
        }
        channel_type::GUILD_CATEGORY => Some(Channel::new(
            channel.id,
            channel.name.unwrap_or_default(),
            ChannelKind::Other("category".to_string()),
        )),
        _ => None,
    }
}

/// Normalize a MESSAGE_CREATE event into a canonical [`Message`].
///
/// Bot-authored traffic and messages with an unparseable creation time
/// convert to `None`. The canonical timestamp keeps Discord's millisecond
/// resolution.
pub fn normalize(event: DiscordMessage) -> Option<Message> {
    if event.author.bot {
        return None;
    }
    let created = DateTime::parse_from_rfc3339(&event.timestamp).ok()?;
    Some(Message::at_millis(
        event.author.id,
        event.content,
        created.timestamp_millis(),
        event.channel_id,
    ))
}
