//! crosstalk is a multi-platform chat bot core. Platform adapters (Slack,
//! Discord) normalize their native events into one canonical [`Message`]
//! shape, a router fans messages out to registered plugin commands, and an
//! outbound facade gives handlers a platform-independent way to send,
//! reply, and post rich content.
//!
//! The typical embedding registers plugins, loads a [`Config`], and spawns
//! one adapter task per configured team:
//!
//! ```no_run
//! use std::sync::Arc;
//! use crosstalk::{spawn_team, Command, Config, Plugin, PluginSet};
//!
//! # async fn example() -> crosstalk::Result<()> {
//! let mut plugins = PluginSet::new();
//! plugins.register(Plugin::new("ping").with_command(Command::trigger(
//!     r"^ping\b",
//!     "!ping",
//!     |inv| async move {
//!         inv.bot.reply(&inv.message, "pong").await;
//!     },
//! )?));
//!
//! let config = Config::load("teams.toml").await?;
//! let plugins = Arc::new(plugins);
//! for team in config.teams {
//!     spawn_team(Arc::new(team), plugins.clone());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod connection;
pub mod error;
pub mod outbound;
pub mod plugin;
pub mod router;
pub mod session;
pub mod types;

pub use adapters::spawn_team;
pub use config::{AdapterKind, Config, RequestMethod, Settings, TeamConfig};
pub use connection::{ConnState, LifecycleEvent};
pub use error::{Error, ErrorKind, Result};
pub use outbound::{BotHandle, SendApi};
pub use plugin::{Command, Invocation, Plugin, PluginSet};
pub use session::{AdapterSession, SharedSession};
pub use types::{Attachment, Channel, ChannelKind, Message, Team, User};
