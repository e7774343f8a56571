//! Discord adapter
//!
//! Speaks the v10 gateway over a websocket (Hello/Identify handshake plus
//! a heartbeat loop) and the REST API for directories and sends. Guild
//! close code 4004 means the token was rejected and ends the adapter.

pub mod client;
pub mod convert;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, error, info, warn};

use self::client::DiscordRestClient;
use self::types::{opcode, DiscordMessage, GatewayFrame, HelloData, Identify, ReadyData};
use super::AdapterEvent;
use crate::config::{RequestMethod, TeamConfig};
use crate::connection::{transition, LifecycleEvent};
use crate::error::{Error, Result};
use crate::outbound::BotHandle;
use crate::plugin::PluginSet;
use crate::router;
use crate::session::{AdapterSession, Directory, SharedSession};
use crate::types::{Channel, Team, User};

type DiscordEvent = AdapterEvent<DiscordMessage>;

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Gateway close code for a rejected token.
const CLOSE_AUTHENTICATION_FAILED: u16 = 4004;

const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Run the Discord adapter for one team until the connection fails fatally.
pub async fn run(config: Arc<TeamConfig>, plugins: Arc<PluginSet>) -> Result<()> {
    let token = config.credential("token")?.to_string();
    let rest = Arc::new(DiscordRestClient::new(token.clone())?);
    let session = AdapterSession::shared();
    let bot = BotHandle::new(session.clone(), rest.clone(), config.clone());

    let (event_tx, mut event_rx) = mpsc::channel(config.settings.message_cache_max_size.max(1));
    let socket = tokio::spawn(socket_loop(token, event_tx));

    while let Some(event) = event_rx.recv().await {
        match event {
            DiscordEvent::Lifecycle(lifecycle) => {
                let t = {
                    let mut session = session.write().await;
                    let t = transition(session.state, lifecycle);
                    session.apply(&t);
                    t
                };
                log_lifecycle(lifecycle);
                if t.load_directories {
                    if let Err(e) = load_directories(&rest, &session, &config).await {
                        warn!("Discord directory load failed: {}", e);
                    }
                }
            }
            DiscordEvent::Identity { self_user, team } => {
                let mut session = session.write().await;
                if team.is_some() {
                    session.team = team;
                }
                session.set_self_user(self_user);
            }
            DiscordEvent::Inbound(raw) => {
                let author = raw.author.clone();
                let Some(message) = convert::normalize(raw) else {
                    continue;
                };
                if is_own_message(&session, &message.user).await {
                    continue;
                }
                remember_author(&session, author).await;
                router::dispatch(&bot, &plugins, &message, config.command_prefix);
            }
        }
    }

    socket
        .await
        .map_err(|e| Error::invalid_state(format!("Discord socket task panicked: {e}")))?
}

/// Record a message author in the user directory. Discord only exposes the
/// full member list behind `fetch_all_members`, so identities seen on the
/// gateway are learned as traffic arrives; this runs before dispatch so
/// `reply` can resolve the sender's handle. First sighting wins.
async fn remember_author(session: &SharedSession, author: types::DiscordUser) {
    let user = convert::convert_user(author);
    let mut session = session.write().await;
    session.users.entry(user.id.clone()).or_insert(user);
}

async fn is_own_message(session: &SharedSession, user_id: &str) -> bool {
    let session = session.read().await;
    session
        .self_user
        .as_ref()
        .is_some_and(|me| me.id == user_id)
}

fn log_lifecycle(lifecycle: LifecycleEvent) {
    match lifecycle {
        LifecycleEvent::Dialing => debug!("Discord connecting"),
        LifecycleEvent::AuthAccepted => info!("Discord authenticated"),
        LifecycleEvent::StreamOpened => debug!("Discord event stream open"),
        LifecycleEvent::Reconnecting => info!("Discord reconnecting"),
        LifecycleEvent::LinkLost => warn!("Discord disconnected"),
        LifecycleEvent::StartFailed => error!("Discord connection failed permanently"),
    }
}

/// Connect-and-read loop with exponential backoff, mirroring the Slack
/// socket loop. A 4004 close ends the adapter.
async fn socket_loop(token: String, events: mpsc::Sender<DiscordEvent>) -> Result<()> {
    let mut delay = RECONNECT_BASE_DELAY;
    let mut first_attempt = true;

    loop {
        let lifecycle = if first_attempt {
            LifecycleEvent::Dialing
        } else {
            LifecycleEvent::Reconnecting
        };
        if events
            .send(DiscordEvent::Lifecycle(lifecycle))
            .await
            .is_err()
        {
            return Ok(());
        }

        match connect_once(&token, &events).await {
            Ok(()) => {
                delay = RECONNECT_BASE_DELAY;
                let _ = events
                    .send(DiscordEvent::Lifecycle(LifecycleEvent::LinkLost))
                    .await;
            }
            Err(e) if e.is_fatal() => {
                let _ = events
                    .send(DiscordEvent::Lifecycle(LifecycleEvent::StartFailed))
                    .await;
                return Err(e);
            }
            Err(e) => {
                warn!("Discord connection error: {}", e);
                let _ = events
                    .send(DiscordEvent::Lifecycle(LifecycleEvent::LinkLost))
                    .await;
            }
        }

        first_attempt = false;
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(RECONNECT_MAX_DELAY);
    }
}

/// One gateway connection: Hello, Identify, then heartbeats interleaved
/// with dispatch events until the stream ends.
async fn connect_once(token: &str, events: &mpsc::Sender<DiscordEvent>) -> Result<()> {
    let (ws_stream, _) = connect_async(GATEWAY_URL)
        .await
        .map_err(|e| Error::network(format!("gateway connection failed: {e}")))?;
    let (mut write, mut read) = ws_stream.split();

    let hello = wait_for_hello(&mut read).await?;
    let identify = serde_json::to_string(&Identify::new(token))
        .map_err(|e| Error::protocol(format!("failed to serialize identify: {e}")))?;
    write
        .send(tungstenite::Message::Text(identify))
        .await
        .map_err(|e| Error::network(format!("identify send failed: {e}")))?;

    let mut heartbeat = tokio::time::interval(Duration::from_millis(hello.heartbeat_interval));
    heartbeat.tick().await; // immediate first tick
    let mut last_seq: Option<u64> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let beat = serde_json::json!({ "op": opcode::HEARTBEAT, "d": last_seq });
                write
                    .send(tungstenite::Message::Text(beat.to_string()))
                    .await
                    .map_err(|e| Error::network(format!("heartbeat send failed: {e}")))?;
            }
            frame = read.next() => {
                let Some(frame) = frame else { return Ok(()) };
                let frame = frame
                    .map_err(|e| Error::network(format!("gateway read failed: {e}")))?;
                match frame {
                    tungstenite::Message::Text(text) => {
                        handle_frame(&text, events, &mut last_seq).await?;
                    }
                    tungstenite::Message::Ping(data) => {
                        write
                            .send(tungstenite::Message::Pong(data))
                            .await
                            .map_err(|e| Error::network(format!("pong failed: {e}")))?;
                    }
                    tungstenite::Message::Close(reason) => {
                        if let Some(frame) = reason {
                            if u16::from(frame.code) == CLOSE_AUTHENTICATION_FAILED {
                                return Err(Error::auth("gateway rejected token (close 4004)"));
                            }
                        }
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Read frames until the Hello arrives.
async fn wait_for_hello<S>(read: &mut S) -> Result<HelloData>
where
    S: Stream<Item = std::result::Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        let frame = frame.map_err(|e| Error::network(format!("gateway read failed: {e}")))?;
        let tungstenite::Message::Text(text) = frame else {
            continue;
        };
        let frame: GatewayFrame = serde_json::from_str(&text)
            .map_err(|e| Error::protocol(format!("unparseable gateway frame: {e}")))?;
        if frame.op == opcode::HELLO {
            return serde_json::from_value(frame.d)
                .map_err(|e| Error::protocol(format!("bad hello payload: {e}")));
        }
    }
    Err(Error::protocol("gateway closed before hello"))
}

/// Decode one text frame and forward anything the event loop consumes.
async fn handle_frame(
    text: &str,
    events: &mpsc::Sender<DiscordEvent>,
    last_seq: &mut Option<u64>,
) -> Result<()> {
    let frame: GatewayFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("unparseable gateway frame: {}", e);
            return Ok(());
        }
    };
    if let Some(seq) = frame.s {
        *last_seq = Some(seq);
    }

    if frame.op != opcode::DISPATCH {
        return Ok(());
    }
    match frame.t.as_deref() {
        Some("READY") => {
            let ready: ReadyData = serde_json::from_value(frame.d)
                .map_err(|e| Error::protocol(format!("bad ready payload: {e}")))?;
            let _ = events
                .send(DiscordEvent::Identity {
                    self_user: convert::convert_user(ready.user),
                    team: None,
                })
                .await;
            let _ = events
                .send(DiscordEvent::Lifecycle(LifecycleEvent::AuthAccepted))
                .await;
            let _ = events
                .send(DiscordEvent::Lifecycle(LifecycleEvent::StreamOpened))
                .await;
        }
        Some("MESSAGE_CREATE") => {
            if let Ok(message) = serde_json::from_value::<DiscordMessage>(frame.d) {
                let _ = events.send(DiscordEvent::Inbound(message)).await;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Load guild directories over REST and install them on the session. The
/// first guild the credential belongs to becomes the session's team.
async fn load_directories(
    rest: &DiscordRestClient,
    session: &SharedSession,
    config: &TeamConfig,
) -> Result<()> {
    let guilds = rest.current_user_guilds().await?;
    let team = guilds
        .first()
        .map(|g| Team::new(g.id.clone(), g.name.clone()));

    let mut channels: Directory<Channel> = Directory::new();
    let channel_lists = match config.settings.request_method {
        RequestMethod::Sequential => {
            let mut lists = Vec::with_capacity(guilds.len());
            for guild in &guilds {
                lists.push(rest.guild_channels(&guild.id).await?);
            }
            lists
        }
        RequestMethod::Burst => {
            futures::future::try_join_all(guilds.iter().map(|g| rest.guild_channels(&g.id)))
                .await?
        }
    };
    for channel in channel_lists.into_iter().flatten() {
        if let Some(channel) = convert::convert_channel(channel) {
            channels.insert(channel.id.clone(), channel);
        }
    }

    let mut users: Directory<User> = Directory::new();
    if config.settings.fetch_all_members {
        let member_lists = match config.settings.request_method {
            RequestMethod::Sequential => {
                let mut lists = Vec::with_capacity(guilds.len());
                for guild in &guilds {
                    lists.push(rest.guild_members(&guild.id).await?);
                }
                lists
            }
            RequestMethod::Burst => {
                futures::future::try_join_all(guilds.iter().map(|g| rest.guild_members(&g.id)))
                    .await?
            }
        };
        for member in member_lists.into_iter().flatten() {
            if let Some(user) = convert::convert_member(member) {
                users.insert(user.id.clone(), user);
            }
        }
    }

    let mut session = session.write().await;
    if !config.settings.fetch_all_members {
        // Keep identities already learned from gateway traffic
        for (id, user) in std::mem::take(&mut session.users) {
            users.entry(id).or_insert(user);
        }
    }
    session.install_directories(users, channels, team);
    info!(
        "Successfully connected to \"{}\" as \"{}\"",
        session.team.as_ref().map(|t| t.name.as_str()).unwrap_or("?"),
        session
            .self_user
            .as_ref()
            .map(|u| u.handle.as_str())
            .unwrap_or("?"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::tests::{test_bot, RecordingApi};
    use crate::types::Message;

    fn author(id: &str, username: &str) -> types::DiscordUser {
        types::DiscordUser {
            id: id.into(),
            username: username.into(),
            bot: false,
            global_name: None,
        }
    }

    #[tokio::test]
    async fn test_gateway_authors_resolve_for_reply() {
        let api = RecordingApi::new();
        let bot = test_bot(api.clone());

        remember_author(bot.session(), author("U1", "clementine")).await;

        let message = Message::at_millis("U1", "!ping", 1_700_000_000_000, "C1");
        bot.reply(&message, "pong").await;

        let sent = api.sent.lock().await;
        assert_eq!(sent[0].1, "(clementine) pong");
    }

    #[tokio::test]
    async fn test_first_author_sighting_wins() {
        let session = AdapterSession::shared();
        remember_author(&session, author("U1", "clementine")).await;

        let mut renamed = author("U1", "clem");
        renamed.global_name = Some("Clementine".into());
        remember_author(&session, renamed).await;

        assert_eq!(session.read().await.handle_of("U1"), Some("clementine"));
    }
}
