// Infrastructure module - reconnection policy and background task plumbing
pub mod backoff;
pub mod task_manager;

pub use backoff::{Backoff, Persistence, ReconnectInterval};
pub use task_manager::TaskManager;
