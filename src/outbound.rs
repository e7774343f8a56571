//! Outbound message facade
//!
//! [`BotHandle`] is what command handlers hold: a cheap clone wrapping the
//! team's session, config, and the platform send API. Send failures are
//! logged and swallowed so a flaky platform call never takes a handler
//! down with it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::TeamConfig;
use crate::error::Result;
use crate::session::SharedSession;
use crate::types::{Attachment, Message};

/// The platform-specific outbound surface each adapter implements.
#[async_trait]
pub trait SendApi: Send + Sync {
    /// Post plain text to a channel or DM.
    async fn send_text(&self, channel_or_dm_id: &str, text: &str) -> Result<()>;

    /// Post text with rich attachments. Platforms without native rich
    /// rendering degrade to the attachments' fallback text.
    async fn send_rich(
        &self,
        channel_or_dm_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<()>;
}

/// Per-team outbound facade handed to every command handler.
#[derive(Clone)]
pub struct BotHandle {
    session: SharedSession,
    send_api: Arc<dyn SendApi>,
    config: Arc<TeamConfig>,
}

impl BotHandle {
    pub fn new(session: SharedSession, send_api: Arc<dyn SendApi>, config: Arc<TeamConfig>) -> Self {
        BotHandle {
            session,
            send_api,
            config,
        }
    }

    /// The team's session state.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// The team's configuration.
    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    /// Post plain text to a channel or DM.
    pub async fn send(&self, channel_or_dm_id: &str, text: &str) {
        if let Err(e) = self.send_api.send_text(channel_or_dm_id, text).await {
            warn!(channel = channel_or_dm_id, "send failed: {}", e);
        }
    }

    /// Post a reply addressed to the sender of `message`: the text is
    /// prefixed with the sender's handle, `(handle) text`, and lands where
    /// the message arrived. Unknown senders get the literal handle
    /// `unknown`.
    pub async fn reply(&self, message: &Message, text: &str) {
        let handle = {
            let session = self.session.read().await;
            session
                .handle_of(&message.user)
                .unwrap_or("unknown")
                .to_string()
        };
        self.send(
            &message.channel_or_dm_id,
            &format!("({}) {}", handle, text),
        )
        .await;
    }

    /// Post text with rich attachments.
    pub async fn send_custom(
        &self,
        channel_or_dm_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) {
        if let Err(e) = self
            .send_api
            .send_rich(channel_or_dm_id, text, attachments)
            .await
        {
            warn!(channel = channel_or_dm_id, "rich send failed: {}", e);
        }
    }

    /// Edit a previously sent message. No connected platform exposes a
    /// safe edit path over the bot credential yet, so this logs and
    /// returns without side effects.
    pub async fn edit(&self, channel_or_dm_id: &str, message_id: &str, _text: &str) {
        warn!(
            channel = channel_or_dm_id,
            message = message_id,
            "edit is not supported on this platform; ignoring"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{AdapterKind, Settings};
    use crate::error::Error;
    use crate::session::AdapterSession;
    use crate::types::User;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Capturing stand-in for a platform send API.
    pub(crate) struct RecordingApi {
        pub sent: Mutex<Vec<(String, String)>>,
        pub rich: Mutex<Vec<(String, String, usize)>>,
        pub fail: bool,
    }

    impl RecordingApi {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(RecordingApi {
                sent: Mutex::new(Vec::new()),
                rich: Mutex::new(Vec::new()),
                fail: false,
            })
        }
    }

    #[async_trait]
    impl SendApi for RecordingApi {
        async fn send_text(&self, channel: &str, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::network("boom"));
            }
            self.sent.lock().await.push((channel.into(), text.into()));
            Ok(())
        }

        async fn send_rich(
            &self,
            channel: &str,
            text: &str,
            attachments: &[Attachment],
        ) -> Result<()> {
            self.rich
                .lock()
                .await
                .push((channel.into(), text.into(), attachments.len()));
            Ok(())
        }
    }

    pub(crate) fn test_config() -> Arc<TeamConfig> {
        Arc::new(TeamConfig {
            adapter: AdapterKind::Slack,
            auth: HashMap::new(),
            command_prefix: Some('!'),
            settings: Settings::default(),
        })
    }

    pub(crate) fn test_bot(api: Arc<RecordingApi>) -> BotHandle {
        BotHandle::new(AdapterSession::shared(), api, test_config())
    }

    #[tokio::test]
    async fn test_send_posts_text() {
        let api = RecordingApi::new();
        let bot = test_bot(api.clone());

        bot.send("C1", "hello").await;
        assert_eq!(
            api.sent.lock().await.as_slice(),
            &[("C1".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_reply_prefixes_sender_handle() {
        let api = RecordingApi::new();
        let bot = test_bot(api.clone());
        {
            let mut session = bot.session().write().await;
            session
                .users
                .insert("U1".into(), User::from_handle("U1", "maeve"));
        }

        let known = Message::at_seconds("U1", "hello", 1_700_000_000.0, "C1");
        let stranger = Message::at_seconds("U404", "hello", 1_700_000_000.0, "C1");
        bot.reply(&known, "these violent delights").await;
        bot.reply(&stranger, "hi").await;

        let sent = api.sent.lock().await;
        assert_eq!(sent[0].0, "C1");
        assert_eq!(sent[0].1, "(maeve) these violent delights");
        assert_eq!(sent[1].1, "(unknown) hi");
    }

    #[tokio::test]
    async fn test_send_custom_forwards_attachments() {
        let api = RecordingApi::new();
        let bot = test_bot(api.clone());

        let attachments = vec![Attachment::new().with_title("result")];
        bot.send_custom("C1", "found it", &attachments).await;

        let rich = api.rich.lock().await;
        assert_eq!(rich.as_slice(), &[("C1".to_string(), "found it".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let api = Arc::new(RecordingApi {
            sent: Mutex::new(Vec::new()),
            rich: Mutex::new(Vec::new()),
            fail: true,
        });
        let bot = test_bot(api.clone());

        // Must not panic or propagate
        bot.send("C1", "hello").await;
        assert!(api.sent.lock().await.is_empty());
    }
}
