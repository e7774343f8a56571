//! Per-adapter session state
//!
//! Each running adapter owns one [`AdapterSession`] behind an `Arc<RwLock>`:
//! the socket task writes lifecycle flags and directory snapshots, while the
//! outbound facade reads them for reply formatting.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::connection::{ConnState, Transition};
use crate::types::{Channel, Team, User};

/// A directory snapshot keyed by opaque platform id.
pub type Directory<T> = HashMap<String, T>;

/// Shared handle to an adapter's session.
pub type SharedSession = Arc<RwLock<AdapterSession>>;

/// Live state of one adapter instance: connection flags, the bot's own
/// identity, and the user/channel/team directories.
#[derive(Debug, Default)]
pub struct AdapterSession {
    /// Current connection state
    pub state: ConnState,
    /// Credential has been accepted on the current connection
    pub connected: bool,
    /// Outbound sends are expected to succeed
    pub can_send: bool,
    /// The bot's own platform identity, known once authenticated
    pub self_user: Option<User>,
    /// Known users, keyed by platform id
    pub users: Directory<User>,
    /// Known channels and DMs, keyed by platform id
    pub channels: Directory<Channel>,
    /// The workspace/guild this session belongs to
    pub team: Option<Team>,
}

impl AdapterSession {
    pub fn new() -> Self {
        AdapterSession::default()
    }

    /// Create a fresh session behind a shared handle.
    pub fn shared() -> SharedSession {
        Arc::new(RwLock::new(AdapterSession::new()))
    }

    /// Apply a connection transition's state and flags.
    pub fn apply(&mut self, transition: &Transition) {
        self.state = transition.next;
        self.connected = transition.connected;
        self.can_send = transition.can_send;
    }

    /// Record the bot's own identity.
    pub fn set_self_user(&mut self, user: User) {
        self.self_user = Some(user);
    }

    /// Replace the directories wholesale with fresh snapshots. Loaders
    /// build complete maps and swap them in; there is no incremental merge.
    pub fn install_directories(
        &mut self,
        users: Directory<User>,
        channels: Directory<Channel>,
        team: Option<Team>,
    ) {
        self.users = users;
        self.channels = channels;
        self.team = team;
    }

    /// Look up a sender's handle for reply formatting.
    pub fn handle_of(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(|u| u.handle.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{transition, LifecycleEvent};
    use crate::types::ChannelKind;

    #[test]
    fn test_apply_tracks_transition_flags() {
        let mut session = AdapterSession::new();
        assert_eq!(session.state, ConnState::Disconnected);

        let t = transition(session.state, LifecycleEvent::Dialing);
        session.apply(&t);
        let t = transition(session.state, LifecycleEvent::AuthAccepted);
        session.apply(&t);
        assert_eq!(session.state, ConnState::Authenticated);
        assert!(session.connected);
        assert!(!session.can_send);

        let t = transition(session.state, LifecycleEvent::StreamOpened);
        session.apply(&t);
        assert!(session.can_send);

        let t = transition(session.state, LifecycleEvent::LinkLost);
        session.apply(&t);
        assert!(!session.connected && !session.can_send);
    }

    #[test]
    fn test_install_directories_replaces_wholesale() {
        let mut session = AdapterSession::new();
        let mut users = Directory::new();
        users.insert("U1".into(), User::from_handle("U1", "bernard"));
        session.install_directories(users, Directory::new(), None);
        assert_eq!(session.handle_of("U1"), Some("bernard"));

        let mut users = Directory::new();
        users.insert("U2".into(), User::from_handle("U2", "elsie"));
        let mut channels = Directory::new();
        channels.insert(
            "C1".into(),
            Channel::new("C1", "#general", ChannelKind::Channel),
        );
        session.install_directories(users, channels, Some(Team::new("T1", "Delos")));

        assert_eq!(session.handle_of("U1"), None);
        assert_eq!(session.handle_of("U2"), Some("elsie"));
        assert!(session.channels.contains_key("C1"));
        assert_eq!(session.team.as_ref().map(|t| t.name.as_str()), Some("Delos"));
    }
}
