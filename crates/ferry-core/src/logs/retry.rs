//! Retry policy for opening instrument logs.

use std::time::Duration;

use tracing::warn;

/// Result of one probe.
#[derive(Debug)]
pub enum Attempt<T> {
    Ready(T),
    NotYet,
}

/// Result of a whole retry run.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Ready(T),
    Exhausted { attempts: u32 },
}

/// Bounded retry with a fixed delay between attempts.
///
/// The instrument may not have created today's log yet, or may hold it
/// locked for a moment. No backoff escalation: the poll interval is the
/// real retry loop, this only smooths over short gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRetry {
    /// Total attempts, including the first one. At least 1.
    pub attempts: u32,

    /// Pause after each failed attempt except the last.
    pub delay: Duration,
}

impl OpenRetry {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Default: 11 tries, 10s apart.
    pub fn default_policy() -> Self {
        Self::new(11, Duration::from_secs(10))
    }

    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Probe until it yields `Ready` or the attempts run out.
    pub async fn run<T, F>(&self, what: &str, mut probe: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Attempt<T>,
    {
        let attempts = self.attempts.max(1);
        for n in 1..=attempts {
            if let Attempt::Ready(value) = probe() {
                return RetryOutcome::Ready(value);
            }
            warn!("{what} not available, try {n}/{attempts}");
            if n < attempts && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        RetryOutcome::Exhausted { attempts }
    }
}

impl Default for OpenRetry {
    fn default() -> Self {
        Self::default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_deployed_values() {
        let p = OpenRetry::default();
        assert_eq!(p.attempts, 11);
        assert_eq!(p.delay, Duration::from_secs(10));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(OpenRetry::new(0, Duration::ZERO).attempts, 1);
    }

    #[tokio::test]
    async fn returns_first_ready_value() {
        let mut calls = 0;
        let out = OpenRetry::new(5, Duration::ZERO)
            .run("log", || {
                calls += 1;
                if calls == 3 { Attempt::Ready(calls) } else { Attempt::NotYet }
            })
            .await;
        assert_eq!(out, RetryOutcome::Ready(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let mut calls = 0;
        let out: RetryOutcome<()> = OpenRetry::new(4, Duration::ZERO)
            .run("log", || {
                calls += 1;
                Attempt::NotYet
            })
            .await;
        assert_eq!(out, RetryOutcome::Exhausted { attempts: 4 });
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn waits_between_attempts() {
        let started = std::time::Instant::now();
        let _: RetryOutcome<()> = OpenRetry::new(3, Duration::from_millis(20))
            .run("log", || Attempt::NotYet)
            .await;
        // two pauses, none after the last attempt
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
