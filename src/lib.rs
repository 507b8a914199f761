//! # pushr-client
//!
//! Client for pushr topic-multiplexed realtime messaging: one WebSocket
//! connection, many named topic subscriptions ("channels"), automatic
//! reconnection with configurable backoff, and an intent-based protocol for
//! authentication, subscription and peer publishing.
//!
//! ## Example
//!
//! ```no_run
//! use pushr_client::{ChannelEvent, PushrClient, PushrClientOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PushrClient::new(
//!         "ws://localhost:9000/pushr",
//!         PushrClientOptions {
//!             auth: Some(json!({"token": "app-token"})),
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     client.connect().await?;
//!
//!     let channel = client.subscribe("room:1", Default::default()).await?;
//!     let mut events = channel.events().await;
//!     while let Some(event) = events.recv().await {
//!         if let ChannelEvent::Message(push) = event {
//!             println!("{:?}", push.data);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;

pub use channel::{ChannelOptions, PushrChannel};
pub use client::{PushrClient, PushrClientBuilder, PushrClientOptions, SocketState};
pub use infrastructure::{Persistence, ReconnectInterval};
pub use messaging::{ChannelEvent, ClientEvent, PushMessage};
pub use types::{Intent, PushrError, Result, WireMessage};
