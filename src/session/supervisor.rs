//! Reconnect policy and backoff.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// When and how often a failed session tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Fixed wait before every attempt.
    pub delay: Duration,
    /// Give up after this many consecutive failures. `None` never gives up.
    pub max_attempts: Option<u32>,
}

impl From<&SessionConfig> for ReconnectPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            delay: config.reconnect_delay,
            max_attempts: config.max_reconnect_attempts,
        }
    }
}

/// Counts consecutive failures and waits out the backoff between attempts.
///
/// Every error kind is handled the same way. The wait is a timer raced
/// against the shutdown token, so it never occupies the runtime thread.
#[derive(Debug)]
pub struct Supervisor {
    policy: ReconnectPolicy,
    failures: u32,
}

impl Supervisor {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Failures since the last successful handshake.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Forget past failures after a handshake succeeds.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Record `cause` and wait the reconnect delay.
    ///
    /// # Errors
    ///
    /// - [`Error::RetriesExhausted`] once the failure cap is reached
    /// - [`Error::Cancelled`] if `shutdown` fires during the wait
    pub async fn backoff(&mut self, cause: &Error, shutdown: &CancellationToken) -> Result<()> {
        self.failures = self.failures.saturating_add(1);

        if let Some(max) = self.policy.max_attempts {
            if self.failures >= max {
                error!(
                    stage = cause.stage(),
                    error = %cause,
                    attempts = self.failures,
                    "giving up on session"
                );
                return Err(Error::RetriesExhausted {
                    attempts: self.failures,
                });
            }
        }

        warn!(
            stage = cause.stage(),
            error = %cause,
            attempt = self.failures,
            delay_ms = self.policy.delay.as_millis() as u64,
            "session failed, reconnecting"
        );

        tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(self.policy.delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(delay_ms: u64, max_attempts: Option<u32>) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(delay_ms),
            max_attempts,
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = SessionConfig::new().with_max_reconnect_attempts(4);
        let policy = ReconnectPolicy::from(&config);
        assert_eq!(policy.delay, Duration::from_millis(3000));
        assert_eq!(policy.max_attempts, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_fixed_delay() {
        let mut supervisor = Supervisor::new(policy(3000, None));
        let shutdown = CancellationToken::new();

        for attempt in 1..=3 {
            let started = tokio::time::Instant::now();
            supervisor
                .backoff(&Error::Read("eof".into()), &shutdown)
                .await
                .unwrap();
            assert_eq!(started.elapsed(), Duration::from_millis(3000));
            assert_eq!(supervisor.consecutive_failures(), attempt);
        }
    }

    #[tokio::test]
    async fn test_backoff_cancelled() {
        let mut supervisor = Supervisor::new(policy(60_000, None));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = supervisor
            .backoff(&Error::Connect("refused".into()), &shutdown)
            .await;
        assert_eq!(result, Err(Error::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_gives_up_at_cap() {
        let mut supervisor = Supervisor::new(policy(10, Some(2)));
        let shutdown = CancellationToken::new();
        let cause = Error::Tls("unknown issuer".into());

        assert!(supervisor.backoff(&cause, &shutdown).await.is_ok());
        assert_eq!(
            supervisor.backoff(&cause, &shutdown).await,
            Err(Error::RetriesExhausted { attempts: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_failures() {
        let mut supervisor = Supervisor::new(policy(10, Some(2)));
        let shutdown = CancellationToken::new();
        let cause = Error::Decode("bad gzip".into());

        supervisor.backoff(&cause, &shutdown).await.unwrap();
        supervisor.reset();
        assert_eq!(supervisor.consecutive_failures(), 0);
        assert!(supervisor.backoff(&cause, &shutdown).await.is_ok());
    }
}
