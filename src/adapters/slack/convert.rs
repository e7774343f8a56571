//! Slack wire-to-canonical conversion
//!
//! Directory records and RTM message events come in platform-shaped and
//! leave as canonical types. Anything the bot should not act on (bot
//! traffic, edits, archived channels, deleted users) converts to `None`.

use super::types::{RtmMessage, SlackChannel, SlackUser, SlackUserProfile};
use crate::session::Directory;
use crate::types::{Channel, ChannelKind, Message, User};

/// Convert a member record. Deleted accounts are dropped; the display name
/// falls back to the handle when the profile carries none.
pub fn convert_user(user: SlackUser) -> Option<User> {
    if user.deleted {
        return None;
    }
    let name = user
        .profile
        .real_name_normalized
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| user.name.clone());
    Some(User::new(user.id, user.name, name))
}

/// Convert a conversation record against the already-loaded user
/// directory. Archived channels and legacy `G`-prefixed groups are
/// dropped. DMs are named after their counterpart's handle.
pub fn convert_channel(channel: SlackChannel, users: &Directory<User>) -> Option<Channel> {
    if channel.is_archived || channel.id.starts_with('G') {
        return None;
    }
    if channel.is_im {
        let handle = channel
            .user
            .as_deref()
            .and_then(|id| users.get(id))
            .map(|u| u.handle.as_str())
            .unwrap_or("Unknown");
        return Some(Channel::new(
            channel.id.clone(),
            format!("#{handle}"),
            ChannelKind::Dm,
        ));
    }
    let name = channel.name?;
    Some(Channel::new(
        channel.id,
        format!("#{name}"),
        ChannelKind::Channel,
    ))
}

/// Normalize an RTM message event into a canonical [`Message`].
///
/// Returns `None` for anything the bot must not react to: bot-authored
/// traffic, subtyped events (edits, joins, topic changes), and frames
/// missing a required field.
pub fn normalize(event: RtmMessage) -> Option<Message> {
    if event.bot_id.is_some() || event.subtype.is_some() {
        return None;
    }
    let user = event.user?;
    let text = event.text?;
    let channel = event.channel?;
    let ts: f64 = event.ts?.parse().ok()?;

    let mut message = Message::at_seconds(user.clone(), text, ts, channel);
    if let Some(profile) = event.user_profile {
        message = message.with_user_profile(profile_user(&user, profile));
    }
    Some(message)
}

/// Build a `User` from the denormalized profile some message events carry.
fn profile_user(user_id: &str, profile: SlackUserProfile) -> User {
    let handle = profile.name.unwrap_or_else(|| user_id.to_string());
    match profile.real_name.filter(|n| !n.is_empty()) {
        Some(name) => User::new(user_id, handle, name),
        None => User::from_handle(user_id, handle),
    }
}
