use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use url::Url;

use super::{ClientState, ConnectionManager, PushrClient, SocketState};
use crate::infrastructure::Persistence;
use crate::types::{Result, EVENT_BUFFER_SIZE};

/// Configuration options recognized by the client.
#[derive(Debug, Clone, Default)]
pub struct PushrClientOptions {
    /// Opaque credential attached to authentication and subscription
    /// requests under the payload's `auth` field.
    pub auth: Option<Value>,
    /// Automatic reconnection policy.
    pub persistence: Persistence,
}

/// Builder for PushrClient that handles initialization
pub struct PushrClientBuilder {
    url: String,
    options: PushrClientOptions,
}

impl PushrClientBuilder {
    /// Create a new builder, validating the endpoint URL
    pub fn new(url: impl Into<String>, options: PushrClientOptions) -> Result<Self> {
        let url = url.into();
        Url::parse(&url)?;
        Ok(Self { url, options })
    }

    /// Build the client and spawn the reconnection watcher
    pub fn build(self) -> PushrClient {
        let mut client_state = ClientState::new(self.options.persistence.clone());

        let (state_tx, state_rx) = watch::channel((SocketState::Ready, false));
        client_state.state_tx = Some(state_tx);

        let (events_tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);

        let client = PushrClient {
            url: self.url,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(client_state)),
            events_tx,
        };

        // Reconnection watcher: arms a cycle when an established connection
        // is lost other than by a local disconnect()
        let client_for_watcher = client.clone();
        tokio::spawn(async move {
            let mut rx = state_rx;

            while rx.changed().await.is_ok() {
                let (state, suppress_reconnect) = *rx.borrow_and_update();

                if state == SocketState::Disconnected
                    && !suppress_reconnect
                    && client_for_watcher.persistence_enabled().await
                {
                    tracing::info!("State watcher detected disconnect, arming reconnection");
                    client_for_watcher.run_reconnect_cycle().await;
                }
            }
            tracing::debug!("Reconnection watcher task finished");
        });

        client
    }
}
