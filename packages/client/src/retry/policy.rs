use crate::config::Config;
use crate::error::Error;
use crate::transport::TransportError;

/// Outcome of consulting a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryDecision {
    /// Send the same request again on a fresh connection.
    Retry,
    /// Surface the error; it carries the number of attempts made.
    GiveUp(Error),
}

/// Decides whether a failed attempt is re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    #[inline]
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    #[inline]
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries())
    }

    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decide after attempt number `attempt` (1-based) failed with `failure`.
    #[must_use]
    pub fn decide(&self, attempt: u32, failure: TransportError) -> RetryDecision {
        let retries_used = attempt.saturating_sub(1);
        if failure.is_retryable() && retries_used < self.max_retries {
            tracing::warn!(attempt, max_retries = self.max_retries, error = %failure, "retrying after transport failure");
            return RetryDecision::Retry;
        }
        RetryDecision::GiveUp(Error::from(failure).with_attempts(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refused() -> TransportError {
        TransportError::connect("example.com:80", "connection refused")
    }

    #[test]
    fn no_retries_by_default() {
        match RetryPolicy::default().decide(1, refused()) {
            RetryDecision::GiveUp(err) => {
                assert!(err.is_connect());
                assert_eq!(err.attempts(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn retries_are_bounded() {
        let policy = RetryPolicy::new(2);
        assert!(matches!(policy.decide(1, refused()), RetryDecision::Retry));
        assert!(matches!(policy.decide(2, TransportError::reset("eof")), RetryDecision::Retry));
        match policy.decide(3, refused()) {
            RetryDecision::GiveUp(err) => assert_eq!(err.attempts(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn late_failures_are_not_retried() {
        let policy = RetryPolicy::new(5);
        for failure in [
            TransportError::reset_after_response("eof in body"),
            TransportError::timeout("read"),
            TransportError::protocol("bad status line"),
        ] {
            match policy.decide(1, failure) {
                RetryDecision::GiveUp(err) => assert_eq!(err.attempts(), 1),
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
