// Module declarations
mod core;
mod state;

// Public API exports
pub use self::core::{ChannelOptions, PushrChannel};
pub use state::{ChannelState, EventBinding};
