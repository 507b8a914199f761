use futures::stream::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;

use super::state::{reduce, LifecycleEvent};
use super::{ClientState, ConnectionManager, PushrClientBuilder, PushrClientOptions, SocketState};
use crate::channel::{ChannelOptions, PushrChannel};
use crate::infrastructure::Backoff;
use crate::messaging::{ClientEvent, MessageRouter};
use crate::types::{Intent, PushrError, Result, WireMessage, RECONNECT_GRACE};

/// The main entry point for pushr realtime messaging.
///
/// `PushrClient` maintains one logical connection to a pushr server,
/// multiplexes it into independent named topic subscriptions, handles the
/// authentication handshake, and reconnects automatically after unplanned
/// disconnects according to the configured [`Persistence`] policy.
///
/// The client is cheap to clone; clones share the same connection and state.
///
/// # Example
///
/// ```no_run
/// use pushr_client::{PushrClient, PushrClientOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PushrClient::new(
///     "ws://localhost:9000/pushr",
///     PushrClientOptions {
///         auth: Some(json!({"token": "app-token"})),
///         ..Default::default()
///     },
/// )?;
///
/// client.connect().await?;
/// let channel = client.subscribe("room:1", Default::default()).await?;
/// channel.publish("greeting", json!({"text": "hello"})).await?;
/// # Ok(())
/// # }
/// ```
///
/// [`Persistence`]: crate::Persistence
#[derive(Clone)]
pub struct PushrClient {
    pub(crate) url: String,
    pub(crate) options: PushrClientOptions,

    // Single-owner transport slot
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    // Client-level notification fan-out
    pub(crate) events_tx: broadcast::Sender<ClientEvent>,
}

impl PushrClient {
    /// Creates a new client without connecting.
    ///
    /// Must be called within a tokio runtime (the reconnection watcher is
    /// spawned at construction). Call [`connect()`](Self::connect) to open
    /// the transport.
    ///
    /// # Errors
    ///
    /// Returns [`PushrError::UrlParse`] if the endpoint URL is malformed.
    pub fn new(url: impl Into<String>, options: PushrClientOptions) -> Result<Self> {
        PushrClientBuilder::new(url, options).map(|builder| builder.build())
    }

    /// Subscribes to client-level notifications.
    ///
    /// Events fire for connection lifecycle edges, authentication results,
    /// reconnection outcomes and state changes. Subscribe before calling
    /// [`connect()`](Self::connect) to observe the initial transitions.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events_tx.subscribe()
    }

    /// Current connection state.
    pub async fn state(&self) -> SocketState {
        self.state.read().await.socket_state
    }

    /// Identifier assigned by the server in CONN_ACK, if one arrived.
    pub async fn client_id(&self) -> Option<String> {
        self.state.read().await.client_id.clone()
    }

    /// Whether a live transport exists right now.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Re-enables automatic reconnection for future disconnects.
    pub async fn enable_persistence(&self) {
        self.state.write().await.persistence.enabled = true;
    }

    /// Prevents new reconnection cycles from being armed. A cycle already
    /// scheduled keeps running.
    pub async fn disable_persistence(&self) {
        self.state.write().await.persistence.enabled = false;
    }

    pub async fn persistence_enabled(&self) -> bool {
        self.state.read().await.persistence.enabled
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // a send error only means nobody is listening right now
        let _ = self.events_tx.send(event);
    }

    /// Runs a lifecycle event through the state-transition function and
    /// fires the matching notifications. `StateChange` is edge-triggered:
    /// it fires only when the computed state actually differs.
    pub(crate) async fn emit_lifecycle(&self, event: LifecycleEvent) {
        let (from, to, suppress_reconnect) = {
            let mut state = self.state.write().await;
            let from = state.socket_state;
            let to = reduce(from, event);
            state.socket_state = to;
            // reconnection only arms for the loss of an established,
            // not manually closed connection
            let suppress_reconnect = state.was_manual_disconnect || !state.was_connected;
            match to {
                SocketState::Connected => state.was_connected = true,
                SocketState::Disconnected | SocketState::TimedOut => {
                    state.was_connected = false;
                }
                _ => {}
            }
            (from, to, suppress_reconnect)
        };

        self.emit(match event {
            LifecycleEvent::Connecting => ClientEvent::Connecting,
            LifecycleEvent::Connected => ClientEvent::Connected,
            LifecycleEvent::Disconnected => ClientEvent::Disconnected,
            LifecycleEvent::Timeout => ClientEvent::Timeout,
        });

        if from != to {
            self.emit(ClientEvent::StateChange { from, to });

            let state = self.state.read().await;
            if let Some(tx) = &state.state_tx {
                let _ = tx.send((to, suppress_reconnect));
            }
        }
    }

    /// Opens a new transport, replacing any previous one.
    ///
    /// Resolves once the WebSocket handshake completes. On resolution the
    /// client emits `connected`, sends the authentication request, flushes
    /// frames queued while disconnected (in call order), and starts the
    /// read task that routes inbound frames. If already connected or
    /// connecting, returns immediately without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket handshake fails; the state settles
    /// back to `Disconnected` so a later attempt can proceed.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if matches!(
                state.socket_state,
                SocketState::Connecting | SocketState::Connected
            ) {
                return Ok(());
            }
            // calling connect() resumes normal operation after a manual
            // disconnect; the flag is re-checked after the handshake
            state.was_manual_disconnect = false;
        }

        self.emit_lifecycle(LifecycleEvent::Connecting).await;
        tracing::info!("Connecting to {}", self.url);

        let ws_stream = match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                // settle the state so the failure is observable and a retry
                // is not mistaken for an in-flight attempt
                self.emit_lifecycle(LifecycleEvent::Disconnected).await;
                return Err(e.into());
            }
        };

        let (write_half, mut read_half) = ws_stream.split();
        self.connection.set_writer(write_half).await;

        // a disconnect() can land while the handshake is in flight; honor
        // it instead of resurrecting the connection underneath the caller
        if self.state.read().await.was_manual_disconnect {
            tracing::info!("Disconnect requested during handshake, discarding transport");
            let _ = self.connection.close().await;
            self.emit_lifecycle(LifecycleEvent::Disconnected).await;
            return Ok(());
        }

        self.emit_lifecycle(LifecycleEvent::Connected).await;

        // authenticate first, then flush anything queued while disconnected
        let auth_request = self.envelope(Intent::AuthReq, None, json!({}));
        if let Err(e) = self.connection.send_message(&auth_request).await {
            tracing::warn!("Failed to send authentication request: {}", e);
        }
        self.flush_send_queue().await;

        let router = MessageRouter::new(self.clone());
        let client = self.clone();
        let mut state = self.state.write().await;
        state.task_manager.spawn(async move {
            tracing::debug!("Starting read task");
            let mut orderly = false;
            while let Some(frame) = read_half.next().await {
                match frame {
                    Ok(Message::Text(text)) => router.route_text(&text).await,
                    Ok(Message::Close(frame)) => {
                        tracing::info!("Server closed connection: {:?}", frame);
                        orderly = true;
                        break;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(other) => {
                        tracing::debug!("Ignoring non-text frame: {:?}", other);
                    }
                    Err(e) => {
                        tracing::warn!("Transport read error: {}", e);
                        break;
                    }
                }
            }
            client.handle_transport_close(orderly).await;
        });

        Ok(())
    }

    /// Closes the connection deliberately.
    ///
    /// Marks the disconnect as manual so no reconnection cycle is armed,
    /// leaves subscribed channels gracefully, aborts background tasks and
    /// closes the transport. A later [`connect()`](Self::connect) resumes
    /// normal operation.
    pub async fn disconnect(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;
            if !matches!(
                state.socket_state,
                SocketState::Connecting | SocketState::Connected
            ) {
                return Ok(());
            }
        }
        tracing::info!("Disconnecting from {}", self.url);

        let channels = self.all_channels().await;
        for channel in channels {
            if channel.subscribed().await {
                if let Err(e) = channel.close().await {
                    tracing::debug!("Channel close during disconnect failed: {}", e);
                }
            }
            channel.force_close().await;
        }

        {
            let mut state = self.state.write().await;
            state.task_manager.abort_all();
        }
        self.connection.close().await?;
        self.emit_lifecycle(LifecycleEvent::Disconnected).await;
        Ok(())
    }

    /// Lazily constructs or returns the channel for a topic.
    ///
    /// A topic maps to exactly one channel instance for the client's
    /// lifetime; repeated calls return the same `Arc`.
    pub async fn channel(&self, topic: &str, options: ChannelOptions) -> Arc<PushrChannel> {
        if let Some(existing) = self.state.read().await.channels.get(topic) {
            return Arc::clone(existing);
        }

        let mut state = self.state.write().await;
        // double-checked: a racing caller may have inserted first
        Arc::clone(state.channels.entry(topic.to_string()).or_insert_with(|| {
            Arc::new(PushrChannel::new(topic.to_string(), self.clone(), options))
        }))
    }

    /// Returns the channel for a topic, opening it if not subscribed.
    pub async fn subscribe(&self, topic: &str, options: ChannelOptions) -> Result<Arc<PushrChannel>> {
        let channel = self.channel(topic, options).await;
        if !channel.subscribed().await {
            channel.open().await?;
        }
        Ok(channel)
    }

    /// Unsubscribes from a topic.
    ///
    /// Delegates to the channel's `close()` when one is registered;
    /// otherwise sends a bare unsubscribe request, covering topics this
    /// client never modeled locally.
    pub async fn unsubscribe(&self, topic: &str) -> Result<()> {
        let channel = { self.state.read().await.channels.get(topic).cloned() };
        match channel {
            Some(channel) => channel.close().await,
            None => {
                self.send(Intent::UnsReq, Some(topic.to_string()), json!({}))
                    .await
            }
        }
    }

    /// Sends a protocol frame, attaching the client's credential to the
    /// payload envelope.
    ///
    /// Sends immediately when connected; otherwise the frame is queued and
    /// flushed, in call order, once the next connection is established.
    /// Frames are never dropped merely because the transport was momentarily
    /// absent; callers needing back-pressure must gate on
    /// [`state()`](Self::state) themselves.
    pub async fn send(&self, intent: Intent, topic: Option<String>, payload: Value) -> Result<()> {
        let message = self.envelope(intent, topic, payload);

        if self.connection.is_connected().await {
            match self.connection.send_message(&message).await {
                Ok(()) => return Ok(()),
                // lost the transport between check and write, queue instead
                Err(PushrError::NotConnected) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::debug!("Queueing {} frame until connected", message.intent);
        self.state.write().await.send_queue.push_back(message);
        Ok(())
    }

    /// Builds the outbound envelope, merging the client credential under
    /// `auth`. A caller-supplied `auth` field in the payload wins.
    fn envelope(&self, intent: Intent, topic: Option<String>, payload: Value) -> WireMessage {
        let mut fields = serde_json::Map::new();
        if let Some(auth) = &self.options.auth {
            fields.insert("auth".to_string(), auth.clone());
        }
        match payload {
            Value::Object(extra) => fields.extend(extra),
            Value::Null => {}
            other => {
                tracing::debug!("Dropping non-object payload: {}", other);
            }
        }
        WireMessage::new(intent, topic, Value::Object(fields))
    }

    async fn flush_send_queue(&self) {
        loop {
            let message = { self.state.write().await.send_queue.pop_front() };
            let Some(message) = message else { break };

            if let Err(e) = self.connection.send_message(&message).await {
                tracing::warn!("Flush interrupted, requeueing frame: {}", e);
                self.state.write().await.send_queue.push_front(message);
                break;
            }
        }
    }

    async fn all_channels(&self) -> Vec<Arc<PushrChannel>> {
        let state = self.state.read().await;
        state.channels.values().cloned().collect()
    }

    /// Reacts to the transport going away: forces every channel into the
    /// unsubscribed state (after a best-effort graceful leave when the close
    /// was orderly) and emits `disconnected`, which arms the reconnection
    /// watcher when persistence allows.
    pub(crate) async fn handle_transport_close(&self, orderly: bool) {
        for channel in self.all_channels().await {
            if orderly && channel.subscribed().await {
                if let Err(e) = channel.close().await {
                    tracing::debug!("Graceful channel close failed: {}", e);
                }
            }
            // no transport remains to deliver an acknowledgement
            channel.force_close().await;
        }

        self.connection.clear_writer().await;
        self.emit_lifecycle(LifecycleEvent::Disconnected).await;
    }

    pub(crate) async fn open_all_channels(&self) {
        for channel in self.all_channels().await {
            if let Err(e) = channel.open().await {
                tracing::warn!("Failed to reopen channel {}: {}", channel.topic(), e);
            }
        }
    }

    /// One reconnection cycle: an initial grace delay, then up to
    /// `persistence.attempts` connect attempts spaced by the configured
    /// interval. Success reopens every known channel and emits
    /// `reconnected`; exhaustion emits `timeout` and leaves the client in
    /// `TimedOut` until something external calls `connect()` again.
    pub(crate) async fn run_reconnect_cycle(&self) {
        let persistence = {
            let mut state = self.state.write().await;
            if state.reconnecting
                || matches!(
                    state.socket_state,
                    SocketState::Connecting | SocketState::Connected
                )
            {
                return;
            }
            state.reconnecting = true;
            state.persistence.clone()
        };

        // short fixed grace before the first attempt, independent of the
        // configured interval, to absorb transient flaps
        sleep(Duration::from_millis(RECONNECT_GRACE)).await;

        let mut backoff = Backoff::new(persistence.interval.clone());
        let reconnected = loop {
            if backoff.attempts_made() >= persistence.attempts {
                break false;
            }
            tracing::info!(
                "Reconnection attempt {} of {}",
                backoff.attempts_made() + 1,
                persistence.attempts
            );
            match self.connect().await {
                Ok(()) => break true,
                Err(e) => {
                    tracing::warn!("Reconnection attempt failed: {}", e);
                    // exhaustion is reported right away, not after one
                    // more interval
                    if backoff.attempts_made() + 1 >= persistence.attempts {
                        break false;
                    }
                    backoff.wait().await;
                }
            }
        };

        if reconnected {
            self.open_all_channels().await;
            self.emit(ClientEvent::Reconnected);
            tracing::info!("Reconnected successfully");
        } else {
            tracing::warn!("Reconnection attempts exhausted");
            self.emit_lifecycle(LifecycleEvent::Timeout).await;
        }

        self.state.write().await.reconnecting = false;
    }
}
