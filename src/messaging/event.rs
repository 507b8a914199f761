use serde_json::Value;

use crate::client::SocketState;

/// Client-level notifications, observable through
/// [`PushrClient::events`](crate::PushrClient::events).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A connection attempt started.
    Connecting,
    /// The transport reported open and the client is usable.
    Connected,
    /// The transport closed.
    Disconnected,
    /// A reconnection cycle exhausted its attempt budget.
    Timeout,
    /// A reconnection cycle succeeded and channels were reopened.
    Reconnected,
    /// The server accepted our credentials.
    Authenticated(Value),
    /// The server rejected our credentials. Not retried automatically.
    AuthRejected(Value),
    /// The computed connection state changed. Fires only on an actual edge,
    /// never for repeated identical transitions.
    StateChange {
        from: SocketState,
        to: SocketState,
    },
}

/// A server push delivered on a topic.
///
/// Mirrors the push payload shape `{event, data, sender}`. `event` is the
/// application-chosen event name used for per-event observer routing.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub event: Option<String>,
    pub data: Value,
    pub sender: Option<Value>,
}

impl PushMessage {
    pub(crate) fn from_payload(payload: &Value) -> Self {
        let event = payload
            .get("event")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        let sender = payload.get("sender").cloned();
        Self {
            event,
            data,
            sender,
        }
    }
}

/// Channel-level notifications, observable through
/// [`PushrChannel::events`](crate::PushrChannel::events).
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// `open()` was called and a subscription request is about to be sent.
    WillOpen,
    /// The server acknowledged the subscription; payload from SUB_ACK.
    DidOpen(Value),
    /// `close()` was called and an unsubscribe request is about to be sent.
    WillClose,
    /// The subscription ended, by acknowledgement or forced close.
    DidClose,
    /// The server rejected the subscription. State unchanged, not retried.
    Rejected(Value),
    /// A message pushed by the server on this topic.
    Message(PushMessage),
    /// A peer publish from this channel was accepted.
    PublishAck(Value),
    /// A peer publish from this channel was rejected or errored.
    PublishRejected(Value),
}
