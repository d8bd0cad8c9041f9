//! Backoff schedules used by the retriers.

use std::time::Duration;

use rand::Rng;

/// Upper bound on any single jittered wait.
pub const MAX_DELAY: Duration = Duration::from_secs(30);
/// Jitter is drawn from `[0, JITTER_MS)`.
pub const JITTER_MS: u64 = 1000;

const SECOND: Duration = Duration::from_millis(1000);

/// `base * 2^attempt`, saturating instead of overflowing.
pub fn exponential(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// `min(base * 2^attempt + jitter, 30s)`; `attempt` is zero-based.
pub fn jittered(base: Duration, attempt: u32, jitter: Duration) -> Duration {
    exponential(base, attempt)
        .saturating_add(jitter)
        .min(MAX_DELAY)
}

pub fn random_jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..JITTER_MS))
}

/// Wait after an overloaded attempt: `2^attempt` seconds, `attempt` one-based.
pub fn overload(attempt: u32) -> Duration {
    exponential(SECOND, attempt)
}

/// Wait after a network failure: `attempt` seconds, `attempt` one-based.
pub fn linear(attempt: u32) -> Duration {
    SECOND.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_doubles_per_attempt() {
        let base = Duration::from_millis(1500);
        assert_eq!(jittered(base, 0, Duration::ZERO), Duration::from_millis(1500));
        assert_eq!(jittered(base, 1, Duration::ZERO), Duration::from_millis(3000));
        assert_eq!(
            jittered(base, 2, Duration::from_millis(250)),
            Duration::from_millis(6250)
        );
    }

    #[test]
    fn test_jittered_caps_at_thirty_seconds() {
        let base = Duration::from_millis(1500);
        assert_eq!(jittered(base, 5, Duration::from_millis(999)), MAX_DELAY);
        assert_eq!(jittered(base, 64, Duration::ZERO), MAX_DELAY);
    }

    #[test]
    fn test_random_jitter_stays_below_one_second() {
        for _ in 0..200 {
            assert!(random_jitter() < Duration::from_millis(JITTER_MS));
        }
    }

    #[test]
    fn test_overload_and_linear_schedules() {
        assert_eq!(overload(1), Duration::from_secs(2));
        assert_eq!(overload(2), Duration::from_secs(4));
        assert_eq!(overload(3), Duration::from_secs(8));
        assert_eq!(linear(1), Duration::from_secs(1));
        assert_eq!(linear(2), Duration::from_secs(2));
    }
}
