use std::time::Duration;

/// Bounded exponential reconnect schedule
///
/// The delay before reconnect attempt `n` (1-based) is
/// `min(base * 2^(n-1), cap)`. Once `max_attempts` reconnects have been
/// scheduled the subscription goes dormant.
///
/// A handshake resets the attempt count. If that connection drops before
/// `stable_after` the reset is undone, so a server that accepts and then
/// immediately closes still runs out of reconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
    pub stable_after: Duration,
}

impl ReconnectPolicy {
    pub const DEFAULT_BASE_SECS: u64 = 5;
    pub const DEFAULT_CAP_SECS: u64 = 20;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_STABLE_SECS: u64 = 10;

    /// Delay before the `attempt`-th reconnect
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }

    /// Whether another reconnect may be scheduled after `attempts` so far
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Whether a connection open this long earned a fresh budget
    pub fn is_stable(&self, open_for: Duration) -> bool {
        open_for >= self.stable_after
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(Self::DEFAULT_BASE_SECS),
            cap: Duration::from_secs(Self::DEFAULT_CAP_SECS),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            stable_after: Duration::from_secs(Self::DEFAULT_STABLE_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(20));
        // Capped from here on
        assert_eq!(policy.delay_for(4), Duration::from_secs(20));
        assert_eq!(policy.delay_for(40), Duration::from_secs(20));
    }

    #[test]
    fn test_budget() {
        let policy = ReconnectPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));

        let none = ReconnectPolicy {
            max_attempts: 0,
            ..ReconnectPolicy::default()
        };
        assert!(!none.allows(0));
    }

    #[test]
    fn test_huge_base_saturates_to_cap() {
        let policy = ReconnectPolicy {
            base: Duration::from_secs(u64::MAX / 2),
            cap: Duration::from_secs(60),
            ..ReconnectPolicy::default()
        };
        assert_eq!(policy.delay_for(3), Duration::from_secs(60));
    }

    #[test]
    fn test_stability_window() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.is_stable(Duration::ZERO));
        assert!(!policy.is_stable(Duration::from_millis(9_999)));
        assert!(policy.is_stable(Duration::from_secs(10)));

        let immediate = ReconnectPolicy {
            stable_after: Duration::ZERO,
            ..ReconnectPolicy::default()
        };
        assert!(immediate.is_stable(Duration::ZERO));
    }
}
