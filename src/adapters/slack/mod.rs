//! Slack adapter
//!
//! Connects over the RTM websocket (`rtm.connect` hands out a socket URL),
//! loads the workspace directories over the Web API, and feeds normalized
//! messages into dispatch.

pub mod client;
pub mod convert;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, error, info, warn};

use self::client::SlackWebClient;
use self::types::{RtmEvent, RtmMessage};
use super::AdapterEvent;
use crate::config::{RequestMethod, TeamConfig};
use crate::connection::{transition, LifecycleEvent};
use crate::error::{Error, Result};
use crate::outbound::BotHandle;
use crate::plugin::PluginSet;
use crate::router;
use crate::session::{AdapterSession, Directory, SharedSession};
use crate::types::{Channel, Team, User};

type SlackEvent = AdapterEvent<RtmMessage>;

const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Run the Slack adapter for one team until the connection fails fatally.
pub async fn run(config: Arc<TeamConfig>, plugins: Arc<PluginSet>) -> Result<()> {
    let token = config.credential("token")?.to_string();
    let client = Arc::new(SlackWebClient::new(token)?);
    let session = AdapterSession::shared();
    let bot = BotHandle::new(session.clone(), client.clone(), config.clone());

    let (event_tx, mut event_rx) = mpsc::channel(config.settings.message_cache_max_size.max(1));
    let socket = tokio::spawn(socket_loop(client.clone(), event_tx));

    while let Some(event) = event_rx.recv().await {
        match event {
            SlackEvent::Lifecycle(lifecycle) => {
                let t = {
                    let mut session = session.write().await;
                    let t = transition(session.state, lifecycle);
                    session.apply(&t);
                    t
                };
                log_lifecycle(lifecycle);
                if t.load_directories {
                    if let Err(e) = load_directories(&client, &session, &config).await {
                        warn!("Slack directory load failed: {}", e);
                    }
                }
            }
            SlackEvent::Identity { self_user, team } => {
                let mut session = session.write().await;
                session.team = team;
                session.set_self_user(self_user);
            }
            SlackEvent::Inbound(raw) => {
                let Some(message) = convert::normalize(raw) else {
                    continue;
                };
                if is_own_message(&session, &message.user).await {
                    continue;
                }
                router::dispatch(&bot, &plugins, &message, config.command_prefix);
            }
        }
    }

    socket
        .await
        .map_err(|e| Error::invalid_state(format!("Slack socket task panicked: {e}")))?
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
        LifecycleEvent::Dialing => debug!("Slack connecting"),
        LifecycleEvent::AuthAccepted => info!("Slack authenticated"),
        LifecycleEvent::StreamOpened => debug!("Slack event stream open"),
        LifecycleEvent::Reconnecting => info!("Slack reconnecting"),
        LifecycleEvent::LinkLost => warn!("Slack disconnected"),
        LifecycleEvent::StartFailed => error!("Slack connection failed permanently"),
    }
}

/// Connect-and-read loop. Transient failures reconnect with exponential
/// backoff; a fatal failure (rejected credential) reports `StartFailed`
/// and ends the adapter.
async fn socket_loop(client: Arc<SlackWebClient>, events: mpsc::Sender<SlackEvent>) -> Result<()> {
    let mut delay = RECONNECT_BASE_DELAY;
    let mut first_attempt = true;

    loop {
        let lifecycle = if first_attempt {
            LifecycleEvent::Dialing
        } else {
            LifecycleEvent::Reconnecting
        };
        if events.send(SlackEvent::Lifecycle(lifecycle)).await.is_err() {
            return Ok(());
        }

        match connect_once(&client, &events).await {
            Ok(()) => {
                // Stream ended cleanly; reset backoff and reconnect
                delay = RECONNECT_BASE_DELAY;
                let _ = events
                    .send(SlackEvent::Lifecycle(LifecycleEvent::LinkLost))
                    .await;
            }
            Err(e) if e.is_fatal() => {
                let _ = events
                    .send(SlackEvent::Lifecycle(LifecycleEvent::StartFailed))
                    .await;
                return Err(e);
            }
            Err(e) => {
                warn!("Slack connection error: {}", e);
                let _ = events
                    .send(SlackEvent::Lifecycle(LifecycleEvent::LinkLost))
                    .await;
            }
        }

        first_attempt = false;
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(RECONNECT_MAX_DELAY);
    }
}

/// One connection: handshake over the Web API, then read RTM frames until
/// the stream ends.
async fn connect_once(
    client: &SlackWebClient,
    events: &mpsc::Sender<SlackEvent>,
) -> Result<()> {
    let connect = client.rtm_connect().await?;
    let ws_url = connect
        .url
        .ok_or_else(|| Error::protocol("rtm.connect returned no socket URL"))?;
    let self_user = connect
        .self_info
        .map(|s| User::from_handle(s.id, s.name))
        .ok_or_else(|| Error::protocol("rtm.connect returned no self identity"))?;
    let team = connect.team.map(|t| Team::new(t.id, t.name));

    let _ = events.send(SlackEvent::Identity { self_user, team }).await;
    let _ = events
        .send(SlackEvent::Lifecycle(LifecycleEvent::AuthAccepted))
        .await;

    let (ws_stream, _) = connect_async(ws_url.as_str())
        .await
        .map_err(|e| Error::network(format!("RTM websocket connection failed: {e}")))?;
    let (mut write, mut read) = ws_stream.split();

    while let Some(frame) = read.next().await {
        let frame = frame.map_err(|e| Error::network(format!("RTM read failed: {e}")))?;
        match frame {
            tungstenite::Message::Text(text) => {
                let event: RtmEvent = match serde_json::from_str(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        debug!("unparseable RTM frame: {}", e);
                        continue;
                    }
                };
                match event {
                    RtmEvent::Hello => {
                        let _ = events
                            .send(SlackEvent::Lifecycle(LifecycleEvent::StreamOpened))
                            .await;
                    }
                    RtmEvent::Goodbye => return Ok(()),
                    RtmEvent::Message(msg) => {
                        let _ = events.send(SlackEvent::Inbound(msg)).await;
                    }
                    RtmEvent::Other => {}
                }
            }
            tungstenite::Message::Ping(data) => {
                write
                    .send(tungstenite::Message::Pong(data))
                    .await
                    .map_err(|e| Error::network(format!("RTM pong failed: {e}")))?;
            }
            tungstenite::Message::Close(_) => return Ok(()),
            _ => {}
        }
    }

    Ok(())
}

/// Load the workspace directories and install them on the session.
///
/// Users load before channels so DM naming can resolve counterpart
/// handles; `request_method = "burst"` issues the independent fetches
/// concurrently instead.
async fn load_directories(
    client: &SlackWebClient,
    session: &SharedSession,
    config: &TeamConfig,
) -> Result<()> {
    let (users_resp, channels_resp, team_resp) = match config.settings.request_method {
        RequestMethod::Sequential => {
            let users = client.users_list().await?;
            let channels = client.conversations_list().await?;
            let team = client.team_info().await?;
            (users, channels, team)
        }
        RequestMethod::Burst => {
            let (users, channels, team) = tokio::join!(
                client.users_list(),
                client.conversations_list(),
                client.team_info(),
            );
            (users?, channels?, team?)
        }
    };

    let users: Directory<User> = users_resp
        .members
        .into_iter()
        .filter_map(convert::convert_user)
        .map(|u| (u.id.clone(), u))
        .collect();
    let channels: Directory<Channel> = channels_resp
        .channels
        .into_iter()
        .filter_map(|c| convert::convert_channel(c, &users))
        .map(|c| (c.id.clone(), c))
        .collect();
    let team = team_resp.team.map(|t| Team::new(t.id, t.name));

    let mut session = session.write().await;
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
