use serde::{Deserialize, Serialize};

use crate::types::Intent;

/// The wire envelope, one JSON object per transport text frame.
///
/// `topic` is `None` for connection-scoped frames (authentication, close,
/// connection acknowledgements). `error` is only present on error intents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub intent: Intent,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl WireMessage {
    pub fn new(intent: Intent, topic: Option<String>, payload: serde_json::Value) -> Self {
        Self {
            intent,
            topic,
            payload,
            error: None,
        }
    }
}
