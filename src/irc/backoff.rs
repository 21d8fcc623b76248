//! Exponential backoff between reconnect attempts.

use std::time::Duration;

/// Delay schedule for reconnecting after a dropped session.
///
/// The delay grows as `initial_delay * multiplier^attempt`, capped at
/// `max_delay`. Attempts are unbounded; the counter resets once a session
/// completes registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    /// Multiplier applied per attempt.
    pub multiplier: f64,
}

impl ReconnectPolicy {
    /// 1s, 2s, 4s, ... up to five minutes.
    pub const DEFAULT: Self = Self {
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(300),
        multiplier: 2.0,
    };

    pub fn new(initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Computes the delay before reconnect attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Clamp the exponent; the cap is reached long before this matters.
        let exponent = attempt.min(64) as i32;
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_doubles_from_one_second() {
        let policy = ReconnectPolicy::DEFAULT;
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(32));
    }

    #[test]
    fn delay_is_capped() {
        let policy = ReconnectPolicy::DEFAULT;
        assert_eq!(policy.delay_for_attempt(9), Duration::from_secs(300));
        assert_eq!(policy.delay_for_attempt(1_000), Duration::from_secs(300));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn custom_policy() {
        let policy =
            ReconnectPolicy::new(Duration::from_millis(250), Duration::from_secs(3), 4.0);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(3));
    }
}
