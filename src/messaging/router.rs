use crate::client::PushrClient;
use crate::messaging::ClientEvent;
use crate::types::{Intent, WireMessage};

/// Routes incoming frames to the client and channel layer.
pub struct MessageRouter {
    client: PushrClient,
}

impl MessageRouter {
    pub fn new(client: PushrClient) -> Self {
        Self { client }
    }

    /// Parses one transport frame and routes it. Malformed frames never
    /// crash the client; they are dropped.
    pub async fn route_text(&self, text: &str) {
        let message: WireMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Dropping malformed frame: {} - Raw: {}", e, text);
                return;
            }
        };
        self.route(message).await;
    }

    /// Routes a parsed frame by intent.
    pub async fn route(&self, message: WireMessage) {
        tracing::debug!(
            "Routing frame: intent={}, topic={:?}",
            message.intent,
            message.topic
        );

        match message.intent {
            Intent::ConnAck => {
                let client_id = message
                    .payload
                    .get("client_id")
                    .or_else(|| message.payload.get("id"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                if let Some(id) = client_id {
                    tracing::info!("Connection acknowledged, client id {}", id);
                    self.client.state.write().await.client_id = Some(id);
                }
            }
            Intent::AuthAck => {
                self.client.emit(ClientEvent::Authenticated(message.payload));
            }
            Intent::AuthRej => {
                self.client.emit(ClientEvent::AuthRejected(message.payload));
            }
            Intent::AuthErr => {
                tracing::warn!("Authentication error: {:?}", message.error);
            }
            Intent::Unknown => {
                // forward compatibility: newer servers may speak intents
                // this client version does not know
                tracing::debug!("Ignoring unrecognized intent");
            }
            intent => {
                let Some(topic) = message.topic.clone() else {
                    tracing::debug!("Dropping topicless {} frame", intent);
                    return;
                };

                let channel = { self.client.state.read().await.channels.get(&topic).cloned() };
                match channel {
                    Some(channel) => channel.handle_intent(intent, &message).await,
                    None => {
                        tracing::debug!("Dropping {} frame for unknown topic {}", intent, topic);
                    }
                }
            }
        }
    }
}
