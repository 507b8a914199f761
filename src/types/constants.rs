/// Default reconnection attempt budget
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 30;

/// Default fixed reconnection interval (milliseconds)
pub const DEFAULT_RECONNECT_INTERVAL: u64 = 1000;

/// Grace delay before the first reconnection attempt (milliseconds),
/// independent of the configured interval, to absorb transient flaps
pub const RECONNECT_GRACE: u64 = 200;

/// Client event broadcast capacity
pub const EVENT_BUFFER_SIZE: usize = 64;

/// Per-observer channel event buffer capacity
pub const CHANNEL_BUFFER_SIZE: usize = 100;
