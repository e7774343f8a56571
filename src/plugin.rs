//! Plugin and command registration
//!
//! A plugin is a named bundle of commands. Commands come in two shapes:
//! triggers, which fire when a prefixed message matches a regex, and
//! listeners, which see every message. Handlers are plain async closures
//! boxed behind a shared function type so the router can spawn them.

use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;

use crate::error::{Error, Result};
use crate::outbound::BotHandle;
use crate::types::Message;

/// A boxed async command handler.
pub type Handler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |inv| Box::pin(f(inv)))
}

/// Everything a handler receives for one dispatch.
#[derive(Clone)]
pub struct Invocation {
    /// Outbound facade for the team the message arrived on
    pub bot: BotHandle,
    /// For triggers, the message with the prefix stripped from its text;
    /// for listeners, the message exactly as normalized
    pub message: Message,
    /// Trigger argument text: everything after the command word, trimmed.
    /// `None` for listeners and for commands invoked with no arguments.
    pub parsed_text: Option<String>,
    /// Whether this dispatch came through the listener path
    pub is_listener: bool,
}

/// A single registered command.
pub enum Command {
    Trigger {
        trigger: Regex,
        handler: Handler,
        usage: String,
    },
    Listener {
        handler: Handler,
        usage: String,
    },
}

impl Command {
    /// Register a trigger command. `pattern` is matched against the
    /// prefix-stripped message text.
    pub fn trigger<F, Fut>(pattern: &str, usage: impl Into<String>, f: F) -> Result<Command>
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let trigger = Regex::new(pattern)
            .map_err(|e| Error::invalid_argument(format!("bad trigger pattern: {}", e)))?;
        Ok(Command::Trigger {
            trigger,
            handler: handler(f),
            usage: usage.into(),
        })
    }

    /// Register a listener command.
    pub fn listener<F, Fut>(usage: impl Into<String>, f: F) -> Command
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Command::Listener {
            handler: handler(f),
            usage: usage.into(),
        }
    }

    /// Human-readable usage line for help output.
    pub fn usage(&self) -> &str {
        match self {
            Command::Trigger { usage, .. } => usage,
            Command::Listener { usage, .. } => usage,
        }
    }
}

/// A named bundle of commands.
pub struct Plugin {
    pub id: String,
    pub commands: Vec<Command>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Plugin {
            id: id.into(),
            commands: Vec::new(),
        }
    }

    /// Add a command, builder-style.
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }
}

/// All registered plugins, in registration order. Dispatch walks every
/// command of every plugin; registration order is the only ordering
/// guarantee handlers get.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Plugin>,
}

impl PluginSet {
    pub fn new() -> Self {
        PluginSet::default()
    }

    pub fn register(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_trigger_pattern_is_rejected() {
        let result = Command::trigger("[unclosed", "!bad", |_inv| async {});
        assert!(result.is_err());
    }

    #[test]
    fn test_plugin_set_preserves_registration_order() {
        let mut plugins = PluginSet::new();
        plugins.register(
            Plugin::new("gif").with_command(
                Command::trigger(r"^gif\b", "!gif <search>", |_inv| async {}).unwrap(),
            ),
        );
        plugins.register(Plugin::new("echo").with_command(Command::listener("", |_inv| async {})));

        let ids: Vec<&str> = plugins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["gif", "echo"]);
        assert_eq!(plugins.iter().next().unwrap().commands[0].usage(), "!gif <search>");
    }
}
