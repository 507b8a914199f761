// Messaging module - notification vocabulary and inbound frame routing
pub mod event;
pub mod router;

pub use event::{ChannelEvent, ClientEvent, PushMessage};
pub use router::MessageRouter;
