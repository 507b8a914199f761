use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

use crate::channel::PushrChannel;
use crate::infrastructure::{Persistence, TaskManager};
use crate::types::WireMessage;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Constructed, never connected.
    Ready,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is open and usable.
    Connected,
    /// The transport closed.
    Disconnected,
    /// A reconnection cycle exhausted its attempts. A fresh `connect()`
    /// resumes normal operation.
    TimedOut,
}

/// Lifecycle events the client emits to itself. The authoritative state is
/// derived from these, never written imperatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Connecting,
    Connected,
    Disconnected,
    Timeout,
}

/// State-transition function: the single place connection state is computed.
///
/// `Connected` only lands from `Connecting`; anything else keeps the prior
/// state, so a stray open notification cannot fabricate a connection.
pub fn reduce(current: SocketState, event: LifecycleEvent) -> SocketState {
    match event {
        LifecycleEvent::Connecting => SocketState::Connecting,
        LifecycleEvent::Connected => {
            if current == SocketState::Connecting {
                SocketState::Connected
            } else {
                current
            }
        }
        LifecycleEvent::Disconnected => SocketState::Disconnected,
        LifecycleEvent::Timeout => SocketState::TimedOut,
    }
}

/// Consolidated mutable state for PushrClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Topic => channel registry. Entries persist across reconnects so
    /// topics can be resubscribed automatically.
    pub channels: HashMap<String, Arc<PushrChannel>>,

    /// Frames accepted while no transport existed, flushed in call order
    /// on the next connect.
    pub send_queue: VecDeque<WireMessage>,

    /// Identifier assigned by the server in CONN_ACK.
    pub client_id: Option<String>,

    /// Current connection state, mutated only through `reduce`.
    pub socket_state: SocketState,

    /// Reconnection policy; `enabled` may be toggled at runtime.
    pub persistence: Persistence,

    /// Whether the last disconnect was requested locally (suppresses
    /// auto-reconnect).
    pub was_manual_disconnect: bool,

    /// True while the current or most recent transport completed its
    /// handshake. Reconnection only arms for the loss of an established
    /// connection, never for a dial that failed outright.
    pub was_connected: bool,

    /// Guard: at most one reconnection cycle per client.
    pub reconnecting: bool,

    /// Background task manager
    pub task_manager: TaskManager,

    /// Sender for state change notifications feeding the reconnection watcher
    pub state_tx: Option<watch::Sender<(SocketState, bool)>>,
}

impl ClientState {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            channels: HashMap::new(),
            send_queue: VecDeque::new(),
            client_id: None,
            socket_state: SocketState::Ready,
            persistence,
            was_manual_disconnect: false,
            was_connected: false,
            reconnecting: false,
            task_manager: TaskManager::new(),
            state_tx: None,
        }
    }
}
