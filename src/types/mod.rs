pub mod constants;
pub mod error;
pub mod intent;
pub mod message;

pub use constants::*;
pub use error::{PushrError, Result};
pub use intent::Intent;
pub use message::WireMessage;
