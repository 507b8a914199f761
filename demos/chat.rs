//! Minimal chat client against a pushr server.
//!
//! ```sh
//! PUSHR_URL=ws://localhost:9000/pushr PUSHR_TOKEN=app-token cargo run --example chat
//! ```

use pushr_client::{
    ChannelEvent, ClientEvent, Persistence, PushrClient, PushrClientOptions, ReconnectInterval,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pushr_client=debug".into()),
        )
        .init();

    let url = std::env::var("PUSHR_URL").unwrap_or_else(|_| "ws://localhost:9000/pushr".into());
    let token = std::env::var("PUSHR_TOKEN").ok();

    let client = PushrClient::new(
        url,
        PushrClientOptions {
            auth: token.map(serde_json::Value::String),
            persistence: Persistence {
                enabled: true,
                attempts: 10,
                interval: ReconnectInterval::custom(|attempt| 500 * (attempt as u64 + 1)),
            },
        },
    )?;

    let mut client_events = client.events();
    tokio::spawn(async move {
        while let Ok(event) = client_events.recv().await {
            match event {
                ClientEvent::Authenticated(payload) => {
                    tracing::info!("Authenticated: {}", payload);
                }
                ClientEvent::AuthRejected(payload) => {
                    tracing::warn!("Authentication rejected: {}", payload);
                }
                ClientEvent::Reconnected => tracing::info!("Back online"),
                ClientEvent::Timeout => tracing::error!("Gave up reconnecting"),
                other => tracing::debug!("Client event: {:?}", other),
            }
        }
    });

    client.connect().await?;

    let channel = client.subscribe("room:lobby", Default::default()).await?;
    let mut messages = channel.on("new_message").await;
    let mut channel_events = channel.events().await;

    channel
        .publish("new_message", json!({"text": "hello from rust"}))
        .await?;

    loop {
        tokio::select! {
            Some(data) = messages.recv() => {
                println!("new_message: {}", data);
            }
            Some(event) = channel_events.recv() => {
                match event {
                    ChannelEvent::DidOpen(_) => tracing::info!("Joined room:lobby"),
                    ChannelEvent::Rejected(payload) => {
                        tracing::error!("Join rejected: {}", payload);
                        break;
                    }
                    ChannelEvent::DidClose => {
                        tracing::info!("Left room:lobby");
                        break;
                    }
                    other => tracing::debug!("Channel event: {:?}", other),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    client.disconnect().await?;
    Ok(())
}
