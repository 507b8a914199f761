use serde_json::Value;
use tokio::sync::mpsc;

use crate::messaging::ChannelEvent;

/// Observer registration for a single application-defined push event name.
#[derive(Debug)]
pub struct EventBinding {
    pub event: String,
    pub sender: mpsc::Sender<Value>,
}

/// Mutable state for a PushrChannel
pub struct ChannelState {
    /// True only between a SUB_ACK for this topic and the next UNS_ACK or
    /// forced close.
    pub subscribed: bool,

    /// Per-channel credential override riding in SUB_REQ payloads.
    pub auth: Option<Value>,

    /// Named-event observers, looked up at dispatch time by the event name
    /// carried inside push payloads.
    pub bindings: Vec<EventBinding>,

    /// Lifecycle and generic message observers.
    pub observers: Vec<mpsc::Sender<ChannelEvent>>,
}

impl ChannelState {
    pub fn new(auth: Option<Value>) -> Self {
        Self {
            subscribed: false,
            auth,
            bindings: Vec::new(),
            observers: Vec::new(),
        }
    }
}
