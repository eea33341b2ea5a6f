//! Retry policy for page requests

use std::time::Duration;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Delay multiplied by `factor` per failed attempt, capped at `max`.
    Exponential { factor: f64, max: Duration },
}

/// Policy applied when a page request fails.
///
/// The production policy retries forever with a fixed delay: a persistently
/// failing endpoint keeps the run alive indefinitely. Tests and cautious
/// operators can bound it with [`RetryPolicy::max_attempts`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed for one request, first try included.
    /// `None` means unbounded.
    pub max_attempts: Option<u32>,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Retry forever, pausing `delay` between attempts.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt may follow `failed` failed attempts.
    pub fn allows(&self, failed: u32) -> bool {
        match self.max_attempts {
            Some(max) => failed < max,
            None => true,
        }
    }

    /// Pause before the retry that follows `failed` failed attempts (1-based).
    pub fn delay_for(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max } => {
                let exponent = failed.saturating_sub(1).min(64) as i32;
                let secs = self.delay.as_secs_f64() * factor.powi(exponent);
                if secs.is_nan() || secs <= 0.0 {
                    Duration::ZERO
                } else if secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_fixed() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, None);
        assert!(policy.allows(1));
        assert!(policy.allows(u32::MAX - 1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1000), Duration::from_secs(5));
    }

    #[test]
    fn test_bounded_attempts() {
        let policy = RetryPolicy::unbounded(Duration::ZERO).with_max_attempts(Some(3));
        assert!(policy.allows(1));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(1)).with_backoff(
            Backoff::Exponential {
                factor: 2.0,
                max: Duration::from_secs(10),
            },
        );
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(500), Duration::from_secs(10));
    }

    #[test]
    fn test_negative_factor_never_goes_below_zero() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(1)).with_backoff(
            Backoff::Exponential {
                factor: -2.0,
                max: Duration::from_secs(10),
            },
        );
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::ZERO);
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }
}
