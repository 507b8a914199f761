// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{PushrClientBuilder, PushrClientOptions};
pub use connection::ConnectionManager;
pub use self::core::PushrClient;
pub use state::{reduce, ClientState, LifecycleEvent, SocketState};
