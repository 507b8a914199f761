use thiserror::Error;

/// Errors that can occur when using the pushr client.
#[derive(Error, Debug)]
pub enum PushrError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Attempted to write while no transport exists
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, PushrError>`.
pub type Result<T> = std::result::Result<T, PushrError>;
