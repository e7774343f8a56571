//! Message dispatch
//!
//! One inbound message fans out to every registered command. Triggers only
//! see messages that start with the team's command prefix and match their
//! pattern; listeners see everything. Handlers run as detached tasks so a
//! slow plugin never stalls the adapter's event loop.

use tokio::task::JoinHandle;

use crate::outbound::BotHandle;
use crate::plugin::{Command, Invocation, PluginSet};
use crate::types::Message;

/// Strip the command prefix from a message body. Returns the remainder
/// (possibly empty) only when the first character is the prefix.
fn strip_prefix(text: &str, prefix: Option<char>) -> Option<String> {
    let prefix = prefix?;
    let mut chars = text.chars();
    if chars.next() == Some(prefix) {
        Some(chars.as_str().to_string())
    } else {
        None
    }
}

/// Extract the argument text of a command: everything after the first
/// whitespace-delimited word, trimmed. `None` when there are no arguments.
fn parse_remainder(stripped: &str) -> Option<String> {
    let (_, rest) = stripped.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Fan a normalized message out to every matching command, spawning one
/// task per firing handler. Returns the spawned handles so callers that
/// care (tests) can await them; the adapters drop them.
pub fn dispatch(
    bot: &BotHandle,
    plugins: &PluginSet,
    message: &Message,
    prefix: Option<char>,
) -> Vec<JoinHandle<()>> {
    let stripped = strip_prefix(&message.text, prefix);
    let mut handles = Vec::new();

    for plugin in plugins.iter() {
        for command in &plugin.commands {
            match command {
                Command::Trigger { trigger, handler, .. } => {
                    let Some(stripped) = stripped.as_deref() else {
                        continue;
                    };
                    if stripped.is_empty() || !trigger.is_match(stripped) {
                        continue;
                    }
                    let mut delivered = message.clone();
                    delivered.text = stripped.to_string();
                    let inv = Invocation {
                        bot: bot.clone(),
                        message: delivered,
                        parsed_text: parse_remainder(stripped),
                        is_listener: false,
                    };
                    handles.push(tokio::spawn(handler(inv)));
                }
                Command::Listener { handler, .. } => {
                    let inv = Invocation {
                        bot: bot.clone(),
                        message: message.clone(),
                        parsed_text: None,
                        is_listener: true,
                    };
                    handles.push(tokio::spawn(handler(inv)));
                }
            }
        }
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::tests::{test_bot, RecordingApi};
    use crate::plugin::Plugin;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn msg(text: &str) -> Message {
        Message::at_seconds("U1", text, 1_700_000_000.0, "C1")
    }

    /// A trigger plugin that reports each invocation on a channel.
    fn capture_trigger(
        pattern: &str,
        tx: mpsc::UnboundedSender<(String, Option<String>, bool)>,
    ) -> Plugin {
        Plugin::new("capture").with_command(
            Command::trigger(pattern, "", move |inv: Invocation| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((inv.message.text, inv.parsed_text, inv.is_listener));
                }
            })
            .unwrap(),
        )
    }

    fn capture_listener(tx: mpsc::UnboundedSender<(String, Option<String>, bool)>) -> Plugin {
        Plugin::new("listen").with_command(Command::listener("", move |inv: Invocation| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((inv.message.text, inv.parsed_text, inv.is_listener));
            }
        }))
    }

    async fn run(plugins: &PluginSet, text: &str, prefix: Option<char>) {
        let bot = test_bot(RecordingApi::new());
        for handle in dispatch(&bot, plugins, &msg(text), prefix) {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_trigger_fires_with_stripped_text_and_arguments() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut plugins = PluginSet::new();
        plugins.register(capture_trigger(r"^gif\b", tx));

        run(&plugins, "!gif dogs wearing hats", Some('!')).await;

        let (text, parsed, is_listener) = rx.recv().await.unwrap();
        assert_eq!(text, "gif dogs wearing hats");
        assert_eq!(parsed.as_deref(), Some("dogs wearing hats"));
        assert!(!is_listener);
    }

    #[tokio::test]
    async fn test_trigger_without_arguments_has_no_parsed_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut plugins = PluginSet::new();
        plugins.register(capture_trigger(r"^excuse", tx));

        run(&plugins, "!excuse", Some('!')).await;
        let (_, parsed, _) = rx.recv().await.unwrap();
        assert_eq!(parsed, None);

        // Trailing whitespace alone is not an argument
        run(&plugins, "!excuse   ", Some('!')).await;
        let (_, parsed, _) = rx.recv().await.unwrap();
        assert_eq!(parsed, None);
    }

    #[tokio::test]
    async fn test_trigger_skips_unprefixed_and_nonmatching_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut plugins = PluginSet::new();
        plugins.register(capture_trigger(r"^gif\b", tx));

        // No prefix char on the message
        run(&plugins, "gif dogs", Some('!')).await;
        // Prefix present but pattern does not match
        run(&plugins, "!steam something", Some('!')).await;
        // Bare prefix
        run(&plugins, "!", Some('!')).await;
        // Team has commands disabled entirely
        run(&plugins, "!gif dogs", None).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_listener_always_fires_with_original_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut plugins = PluginSet::new();
        plugins.register(capture_listener(tx));

        run(&plugins, "just chatting", Some('!')).await;
        let (text, parsed, is_listener) = rx.recv().await.unwrap();
        assert_eq!(text, "just chatting");
        assert_eq!(parsed, None);
        assert!(is_listener);

        // Listeners see prefixed messages too, unstripped
        run(&plugins, "!gif dogs", Some('!')).await;
        let (text, _, _) = rx.recv().await.unwrap();
        assert_eq!(text, "!gif dogs");
    }

    #[tokio::test]
    async fn test_trigger_and_listener_both_fire_on_one_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut plugins = PluginSet::new();
        plugins.register(capture_trigger(r"^gif\b", tx.clone()));
        plugins.register(capture_listener(tx));

        run(&plugins, "!gif dogs", Some('!')).await;

        let mut fired = Vec::new();
        fired.push(rx.recv().await.unwrap());
        fired.push(rx.recv().await.unwrap());
        assert!(fired.iter().any(|(_, _, l)| !*l));
        assert!(fired.iter().any(|(_, _, l)| *l));
    }
}
