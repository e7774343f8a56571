//! Connection state machine
//!
//! Each adapter's socket layer pushes lifecycle events; the adapter's event
//! loop feeds them through [`transition`] and applies the result to its
//! session. Keeping the table pure makes the state machine testable without
//! a socket in sight.

/// Connection state of one adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    /// Not connected; initial state, and terminal after a fatal start failure
    #[default]
    Disconnected,
    /// Dialing or authenticating (also the reconnect-in-progress state)
    Connecting,
    /// Credential accepted, event stream not yet open
    Authenticated,
    /// Event stream fully open; re-enterable after a reconnect cycle
    Ready,
}

/// Lifecycle events pushed by a platform socket task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A connection attempt is starting
    Dialing,
    /// Platform confirmed credential acceptance
    AuthAccepted,
    /// Platform signalled the event stream is fully open
    StreamOpened,
    /// Platform signalled an in-progress reconnect attempt
    Reconnecting,
    /// Transport link lost; the socket layer will retry on its own
    LinkLost,
    /// Unrecoverable start failure (bad credential, handshake rejected);
    /// leaves the adapter permanently disconnected
    StartFailed,
}

/// Outcome of one transition: next state, session flag values, and whether
/// the directory loader must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ConnState,
    pub connected: bool,
    pub can_send: bool,
    /// One-shot directory load, fired on every entry into `Ready`
    pub load_directories: bool,
}

impl Transition {
    fn to(next: ConnState) -> Self {
        Transition {
            next,
            connected: false,
            can_send: false,
            load_directories: false,
        }
    }
}

/// The transition table.
///
/// Events that arrive while already `Disconnected` are stale (the only
/// paths there are link loss and fatal failure, and the socket layer always
/// re-dials before anything else) and leave the state untouched.
pub fn transition(state: ConnState, event: LifecycleEvent) -> Transition {
    use ConnState::*;
    use LifecycleEvent::*;

    match (state, event) {
        (_, Dialing) | (_, Reconnecting) => Transition::to(Connecting),
        (_, LinkLost) | (_, StartFailed) => Transition::to(Disconnected),
        (Disconnected, AuthAccepted) | (Disconnected, StreamOpened) => {
            Transition::to(Disconnected)
        }
        (_, AuthAccepted) => Transition {
            connected: true,
            ..Transition::to(Authenticated)
        },
        (_, StreamOpened) => Transition {
            connected: true,
            can_send: true,
            load_directories: true,
            ..Transition::to(Ready)
        },
    }
}
