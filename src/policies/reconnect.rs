//! # Reconnect policy for lost tester sessions.
//!
//! [`ReconnectPolicy`] bounds how a resource heals a device-initiated
//! disconnect: at most [`ReconnectPolicy::attempts`] tries, the try with index
//! `n` (0-based) waiting `n × step` first, clamped to `max`, then jittered.
//!
//! With the defaults (`attempts = 5`, `step = 2s`) the waits are 0, 2, 4, 6
//! and 8 seconds; after the fifth failure the resource stays offline until a
//! user reconnects it.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use benchvisor::ReconnectPolicy;
//!
//! let policy = ReconnectPolicy::default();
//! assert_eq!(policy.delay(0), Duration::ZERO);
//! assert_eq!(policy.delay(4), Duration::from_secs(8));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Bounded linear reconnect schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Number of reconnect tries before giving up (`0` disables reconnect).
    pub attempts: u32,
    /// Delay increment per try.
    pub step: Duration,
    /// Upper bound of a single delay.
    pub max: Duration,
    /// Randomization of each delay.
    pub jitter: JitterPolicy,
}

impl Default for ReconnectPolicy {
    /// `attempts = 5`, `step = 2s`, `max = 30s`, no jitter.
    fn default() -> Self {
        Self {
            attempts: 5,
            step: Duration::from_secs(2),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::None,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects automatically.
    pub fn disabled() -> Self {
        Self {
            attempts: 0,
            ..Self::default()
        }
    }

    /// Wait before the try with index `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.step.checked_mul(attempt).unwrap_or(self.max).min(self.max);
        self.jitter.apply(base)
    }

    /// Iterates the tries as `(attempt, delay)` pairs.
    pub fn schedule(&self) -> impl Iterator<Item = (u32, Duration)> + '_ {
        (0..self.attempts).map(|attempt| (attempt, self.delay(attempt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_linear() {
        let delays: Vec<_> = ReconnectPolicy::default()
            .schedule()
            .map(|(_, d)| d.as_secs())
            .collect();
        assert_eq!(delays, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = ReconnectPolicy {
            attempts: 100,
            step: Duration::from_secs(10),
            max: Duration::from_secs(25),
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.delay(2), Duration::from_secs(20));
        assert_eq!(policy.delay(3), Duration::from_secs(25));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(25));
    }

    #[test]
    fn test_disabled_has_no_tries() {
        assert_eq!(ReconnectPolicy::disabled().schedule().count(), 0);
    }
}
