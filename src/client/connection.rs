use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::types::{PushrError, Result, WireMessage};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Single-owner slot for the live transport's write half.
///
/// The client owns at most one transport at a time; (re)connecting replaces
/// the writer as a move, and old handles are never referenced again.
pub struct ConnectionManager {
    writer: RwLock<Option<WsSink>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            writer: RwLock::new(None),
        }
    }

    /// Sets the write sink (called after a successful connection)
    pub async fn set_writer(&self, writer: WsSink) {
        let mut slot = self.writer.write().await;
        *slot = Some(writer);
    }

    /// Checks if a live transport exists
    pub async fn is_connected(&self) -> bool {
        self.writer.read().await.is_some()
    }

    /// Sends one frame through the transport
    pub async fn send_message(&self, message: &WireMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;

        let mut slot = self.writer.write().await;
        match slot.as_mut() {
            Some(writer) => {
                writer.send(Message::Text(json.into())).await?;
                Ok(())
            }
            None => Err(PushrError::NotConnected),
        }
    }

    /// Closes the transport gracefully and drops the writer
    pub async fn close(&self) -> Result<()> {
        let mut slot = self.writer.write().await;
        if let Some(writer) = slot.as_mut() {
            writer.close().await?;
        }
        *slot = None;
        Ok(())
    }

    /// Drops the writer without a close handshake (used after an abrupt
    /// transport loss)
    pub async fn clear_writer(&self) {
        let mut slot = self.writer.write().await;
        *slot = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
