use rand::Rng;
use std::time::Duration;

/// Doubling stops after this many attempts; the cap takes over long before.
const MAX_DOUBLINGS: u32 = 16;

/// Reconnect delay schedule for the consumer loop.
///
/// The delay for attempt `n` is `initial * 2^n`, capped at `max`, plus up to
/// `jitter` (a fraction of the delay) of random extra wait. Setting
/// `max == initial` and `jitter == 0.0` gives a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub jitter: f64,
}

/// 5s doubling up to 60s, with up to 20% jitter. The simplest schedule is a
/// flat 5s retry; [`ReconnectBackoff::fixed`] still provides it.
impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(60),
            jitter: 0.2,
        }
    }
}

impl ReconnectBackoff {
    /// A fixed interval with no growth and no jitter.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial: interval,
            max: interval,
            jitter: 0.0,
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.pow(attempt.min(MAX_DOUBLINGS));
        self.initial.saturating_mul(factor).min(self.max)
    }

    /// Delay before reconnect attempt `attempt` (0-based), with jitter applied.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = rand::rng().random_range(0.0..=self.jitter);
        Duration::try_from_secs_f64(base.as_secs_f64() * (1.0 + extra)).unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_doubles_until_cap() {
        let backoff = ReconnectBackoff::default();
        assert_eq!(backoff.base_delay(0), Duration::from_secs(5));
        assert_eq!(backoff.base_delay(1), Duration::from_secs(10));
        assert_eq!(backoff.base_delay(2), Duration::from_secs(20));
        assert_eq!(backoff.base_delay(3), Duration::from_secs(40));
        assert_eq!(backoff.base_delay(4), Duration::from_secs(60));
        assert_eq!(backoff.base_delay(1_000), Duration::from_secs(60));
        assert_eq!(backoff.base_delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_fixed_interval() {
        let backoff = ReconnectBackoff::fixed(Duration::from_secs(5));
        for attempt in [0, 1, 7, 100] {
            assert_eq!(backoff.delay(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_huge_delays_do_not_overflow() {
        let backoff = ReconnectBackoff {
            initial: Duration::from_secs(u64::MAX),
            max: Duration::from_secs(u64::MAX),
            jitter: 0.2,
        };
        for attempt in [0, 1, u32::MAX] {
            assert!(backoff.delay(attempt) >= Duration::from_secs(u64::MAX));
        }
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let backoff = ReconnectBackoff::default();
        for attempt in 0..10 {
            let base = backoff.base_delay(attempt);
            let delay = backoff.delay(attempt);
            assert!(delay >= base);
            assert!(delay <= base.mul_f64(1.2));
        }
    }
}
