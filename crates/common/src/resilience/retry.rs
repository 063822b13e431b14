//! Attempt loop with a pluggable retry policy and a fixed pause
//!
//! The policy sees every failure first, so a non-retryable error ends the
//! loop even with attempts left. On reaching the attempt ceiling the last
//! error is returned to the caller as-is.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why the loop gave up
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts, last error: {last:?}")]
    AttemptsExhausted { attempts: u32, last: E },

    #[error("stopped after {attempts} attempts on non-retryable error: {error:?}")]
    NonRetryable { attempts: u32, error: E },

    #[error("invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl<E> RetryError<E> {
    /// Attempts made before giving up.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::AttemptsExhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => {
                *attempts
            }
            Self::InvalidConfiguration { .. } => 0,
        }
    }
}

pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Decides, per failure, whether another attempt is worth making
pub trait RetryPolicy<E> {
    /// `attempt` is 0-based.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempt ceiling, including the first attempt
    pub max_attempts: u32,
    /// Pause before every attempt after the first
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff: Duration::from_millis(100) }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub const fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = delay;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Runs an operation until it succeeds, the policy stops it, or the
/// attempt ceiling is reached
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub const fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let attempt_number = attempt + 1;
            debug!(attempt = attempt_number, max_attempts, "running attempt");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt = attempt_number, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                debug!(attempt = attempt_number, ?error, "policy stopped the loop");
                return Err(RetryError::NonRetryable { attempts: attempt_number, error });
            }

            if attempt_number >= max_attempts {
                warn!(attempts = attempt_number, ?error, "attempt ceiling reached");
                return Err(RetryError::AttemptsExhausted { attempts: attempt_number, last: error });
            }

            let delay = self.config.backoff;
            debug!(attempt = attempt_number, ?delay, "pausing before next attempt");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}
