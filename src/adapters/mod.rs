//! Platform adapters
//!
//! Each adapter runs as one task per configured team: a socket task feeds
//! raw platform events into a bounded channel, and an event loop drives the
//! connection state machine, loads directories, and dispatches normalized
//! messages to the plugins.

pub mod discord;
pub mod slack;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{AdapterKind, TeamConfig};
use crate::connection::LifecycleEvent;
use crate::error::Result;
use crate::plugin::PluginSet;
use crate::types::{Team, User};

/// What a platform socket task pushes to its adapter's event loop.
#[derive(Debug)]
pub enum AdapterEvent<Raw> {
    /// Connection lifecycle change
    Lifecycle(LifecycleEvent),
    /// The bot's own identity, learned during the handshake
    Identity {
        self_user: User,
        team: Option<Team>,
    },
    /// A raw inbound platform event for the normalizer
    Inbound(Raw),
}

/// Spawn the adapter task for one configured team.
pub fn spawn_team(config: Arc<TeamConfig>, plugins: Arc<PluginSet>) -> JoinHandle<Result<()>> {
    match config.adapter {
        AdapterKind::Slack => tokio::spawn(slack::run(config, plugins)),
        AdapterKind::Discord => tokio::spawn(discord::run(config, plugins)),
    }
}
