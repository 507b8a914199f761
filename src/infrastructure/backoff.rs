use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::types::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL};

/// Delay between reconnection attempts, fixed or computed per attempt.
///
/// A custom interval receives the number of attempts already made, enabling
/// linear, exponential or jittered backoff supplied by the caller:
///
/// ```
/// use pushr_client::ReconnectInterval;
///
/// let exponential = ReconnectInterval::custom(|attempt| 500 * 2u64.pow(attempt));
/// assert_eq!(exponential.delay_for(0).as_millis(), 500);
/// assert_eq!(exponential.delay_for(3).as_millis(), 4000);
/// ```
#[derive(Clone)]
pub enum ReconnectInterval {
    /// Fixed delay in milliseconds.
    Fixed(u64),
    /// Delay in milliseconds as a function of the attempt index.
    Custom(Arc<dyn Fn(u32) -> u64 + Send + Sync>),
}

impl ReconnectInterval {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> u64 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = match self {
            Self::Fixed(millis) => *millis,
            Self::Custom(f) => f(attempt),
        };
        Duration::from_millis(millis)
    }
}

impl Default for ReconnectInterval {
    fn default() -> Self {
        Self::Fixed(DEFAULT_RECONNECT_INTERVAL)
    }
}

impl From<u64> for ReconnectInterval {
    fn from(millis: u64) -> Self {
        Self::Fixed(millis)
    }
}

impl std::fmt::Debug for ReconnectInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(millis) => f.debug_tuple("Fixed").field(millis).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

/// Configuration governing automatic reconnection after disconnect.
#[derive(Debug, Clone)]
pub struct Persistence {
    /// Whether to reconnect automatically after an unplanned close.
    pub enabled: bool,
    /// Maximum reconnection attempts per disconnect.
    pub attempts: u32,
    /// Delay between attempts.
    pub interval: ReconnectInterval,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            enabled: true,
            attempts: DEFAULT_RECONNECT_ATTEMPTS,
            interval: ReconnectInterval::default(),
        }
    }
}

/// Tracks attempts within one reconnection cycle.
pub struct Backoff {
    attempts_made: u32,
    interval: ReconnectInterval,
}

impl Backoff {
    pub fn new(interval: ReconnectInterval) -> Self {
        Self {
            attempts_made: 0,
            interval,
        }
    }

    /// Number of attempts completed so far in this cycle.
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Delay to take after the attempt that just failed, advancing the
    /// attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.interval.delay_for(self.attempts_made);
        self.attempts_made += 1;
        delay
    }

    /// Sleep for the next backoff delay.
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval_is_constant() {
        let mut backoff = Backoff::new(ReconnectInterval::Fixed(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.attempts_made(), 2);
    }

    #[test]
    fn test_custom_interval_sees_attempt_index() {
        let mut backoff = Backoff::new(ReconnectInterval::custom(|attempt| (attempt as u64 + 1) * 10));
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
        assert_eq!(backoff.next_delay(), Duration::from_millis(20));
        assert_eq!(backoff.next_delay(), Duration::from_millis(30));
    }

    #[test]
    fn test_persistence_defaults() {
        let persistence = Persistence::default();
        assert!(persistence.enabled);
        assert_eq!(persistence.attempts, DEFAULT_RECONNECT_ATTEMPTS);
        assert_eq!(
            persistence.interval.delay_for(0),
            Duration::from_millis(DEFAULT_RECONNECT_INTERVAL)
        );
    }
}
