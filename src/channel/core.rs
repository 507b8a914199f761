use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::state::{ChannelState, EventBinding};
use crate::client::PushrClient;
use crate::messaging::{ChannelEvent, PushMessage};
use crate::types::{Intent, Result, WireMessage, CHANNEL_BUFFER_SIZE};

/// Configuration options for a channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelOptions {
    /// Credential override attached to this channel's subscription requests.
    /// When `None`, the client's credential alone is used.
    pub auth: Option<Value>,
}

/// Client-side representation of a subscription to a named topic.
///
/// A topic maps to at most one channel instance for the lifetime of its
/// client; channels are created lazily by
/// [`PushrClient::channel`](crate::PushrClient::channel) and live until the
/// client is discarded. A channel can be closed and later reopened.
///
/// # Example
///
/// ```no_run
/// use pushr_client::{ChannelEvent, PushrClient, PushrClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PushrClient::new("ws://localhost:9000/pushr", PushrClientOptions::default())?;
/// client.connect().await?;
///
/// let channel = client.subscribe("room:1", Default::default()).await?;
/// let mut events = channel.events().await;
///
/// while let Some(event) = events.recv().await {
///     if let ChannelEvent::Message(push) = event {
///         println!("{:?}", push.data);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct PushrChannel {
    topic: String,
    client: PushrClient,
    pub(crate) state: Arc<RwLock<ChannelState>>,
}

impl PushrChannel {
    pub(crate) fn new(topic: String, client: PushrClient, options: ChannelOptions) -> Self {
        Self {
            topic,
            client,
            state: Arc::new(RwLock::new(ChannelState::new(options.auth))),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether a subscription acknowledgement is currently in effect.
    pub async fn subscribed(&self) -> bool {
        self.state.read().await.subscribed
    }

    /// Registers a lifecycle and message observer.
    ///
    /// The receiver sees every [`ChannelEvent`] for this channel: open/close
    /// lifecycle edges, rejections, publish results, and every server push
    /// regardless of its embedded event name.
    pub async fn events(&self) -> mpsc::Receiver<ChannelEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        self.state.write().await.observers.push(tx);
        rx
    }

    /// Registers an observer for a specific push event name.
    ///
    /// Only the `data` field of matching pushes is delivered.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example(channel: std::sync::Arc<pushr_client::PushrChannel>) {
    /// let mut messages = channel.on("new_message").await;
    /// tokio::spawn(async move {
    ///     while let Some(data) = messages.recv().await {
    ///         println!("new_message: {data}");
    ///     }
    /// });
    /// # }
    /// ```
    pub async fn on(&self, event: &str) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let binding = EventBinding {
            event: event.to_string(),
            sender: tx,
        };
        self.state.write().await.bindings.push(binding);
        rx
    }

    /// Requests a subscription for this topic.
    ///
    /// No-op while already subscribed, so reopening every channel after a
    /// reconnect never enqueues duplicate requests. Fires
    /// [`ChannelEvent::WillOpen`] before the request goes out; the
    /// `subscribed` flag only flips when the server acknowledges.
    pub async fn open(&self) -> Result<()> {
        let (already_subscribed, auth) = {
            let state = self.state.read().await;
            (state.subscribed, state.auth.clone())
        };
        if already_subscribed {
            return Ok(());
        }

        self.notify(ChannelEvent::WillOpen).await;

        let payload = match auth {
            Some(auth) => json!({ "auth": auth }),
            None => json!({}),
        };
        self.client
            .send(Intent::SubReq, Some(self.topic.clone()), payload)
            .await
    }

    /// Requests an unsubscribe for this topic.
    ///
    /// Fires [`ChannelEvent::WillClose`] then sends UNS_REQ; the state does
    /// not change until the server's UNS_ACK arrives (or the transport is
    /// lost and the channel is force-closed).
    pub async fn close(&self) -> Result<()> {
        self.notify(ChannelEvent::WillClose).await;
        self.client
            .send(Intent::UnsReq, Some(self.topic.clone()), json!({}))
            .await
    }

    /// Publishes a message to the other subscribers of this topic.
    ///
    /// The outcome arrives as [`ChannelEvent::PublishAck`] or
    /// [`ChannelEvent::PublishRejected`] on the observer stream.
    pub async fn publish(&self, event: &str, data: Value) -> Result<()> {
        self.client
            .send(
                Intent::PubReq,
                Some(self.topic.clone()),
                json!({ "event": event, "data": data }),
            )
            .await
    }

    /// Flips the channel to unsubscribed locally, used when the transport
    /// vanished and no acknowledgement can arrive.
    pub(crate) async fn force_close(&self) {
        let message = WireMessage::new(Intent::UnsAck, Some(self.topic.clone()), Value::Null);
        self.handle_intent(Intent::UnsAck, &message).await;
    }

    /// Single entry point for inbound frames addressed to this topic.
    pub(crate) async fn handle_intent(&self, intent: Intent, message: &WireMessage) {
        match intent {
            Intent::SubAck => {
                self.state.write().await.subscribed = true;
                self.notify(ChannelEvent::DidOpen(message.payload.clone()))
                    .await;
            }
            Intent::SubRej => {
                // state unchanged, the caller decides whether to retry
                self.notify(ChannelEvent::Rejected(message.payload.clone()))
                    .await;
            }
            Intent::UnsAck => {
                self.state.write().await.subscribed = false;
                self.notify(ChannelEvent::DidClose).await;
            }
            Intent::Msg => {
                let push = PushMessage::from_payload(&message.payload);
                self.fan_out(&push).await;
                self.notify(ChannelEvent::Message(push)).await;
            }
            Intent::PubAck => {
                self.notify(ChannelEvent::PublishAck(message.payload.clone()))
                    .await;
            }
            Intent::PubRej | Intent::PubErr => {
                let detail = message
                    .error
                    .clone()
                    .unwrap_or_else(|| message.payload.clone());
                self.notify(ChannelEvent::PublishRejected(detail)).await;
            }
            other => {
                tracing::debug!("Ignoring intent {} on topic {}", other, self.topic);
            }
        }
    }

    /// Delivers a push to the observers bound to its embedded event name.
    async fn fan_out(&self, push: &PushMessage) {
        let Some(event) = &push.event else {
            return;
        };

        let senders: Vec<mpsc::Sender<Value>> = {
            let state = self.state.read().await;
            state
                .bindings
                .iter()
                .filter(|binding| &binding.event == event)
                .map(|binding| binding.sender.clone())
                .collect()
        };

        for sender in senders {
            if sender.send(push.data.clone()).await.is_err() {
                tracing::debug!(
                    "Dropped push for event '{}' on topic {}: observer gone",
                    event,
                    self.topic
                );
            }
        }
    }

    async fn notify(&self, event: ChannelEvent) {
        let observers: Vec<mpsc::Sender<ChannelEvent>> =
            { self.state.read().await.observers.clone() };

        for observer in observers {
            if observer.send(event.clone()).await.is_err() {
                tracing::debug!("Channel observer gone on topic {}", self.topic);
            }
        }
    }
}
