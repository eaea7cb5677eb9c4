//! Bounded retry around the executor for idempotent verbs.
//!
//! Only `ConnectionFailure` is retried. A classified rejection (400, 404,
//! ...) is returned on the attempt that produced it.
//!
//! Each attempt gets the transport's own timeout; there is no deadline
//! across attempts, so the worst case is
//! `max_attempts * (timeout + delay)`.

use std::time::Duration;

use tracing::{error, warn};

use crate::error::ApiError;
use crate::executor::{ApiResponse, Executor};
use crate::http::HttpRequest;

/// How long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The same `delay` before every retry.
    #[default]
    Fixed,
    /// `delay * factor^(n-1)` before retry `n`, capped at `max`.
    Exponential { factor: u32, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 act as 1.
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    /// When false, exhaustion yields `Ok(None)` instead of an error.
    pub raise_on_exhausted: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
            raise_on_exhausted: true,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            ..Self::default()
        }
    }

    pub fn raising(self) -> Self {
        Self {
            raise_on_exhausted: true,
            ..self
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max } => {
                let exponent = attempt.saturating_sub(1);
                let multiplier = factor.max(1).saturating_pow(exponent);
                self.delay.saturating_mul(multiplier).min(max)
            }
        }
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Execute `request`, retrying connection failures per `policy`.
///
/// The same `HttpRequest` value is replayed on every attempt. A
/// non-idempotent request gets a single attempt regardless of the policy.
pub fn retry_request(
    executor: &Executor,
    request: &HttpRequest,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<Option<ApiResponse>, ApiError> {
    let max_attempts = if request.method.is_idempotent() {
        policy.attempts()
    } else {
        1
    };

    let mut attempt = 1;
    loop {
        let message = match executor.execute(request) {
            Ok(response) => return Ok(Some(response)),
            Err(ApiError::ConnectionFailure { message, .. }) => message,
            Err(other) => return Err(other),
        };

        if attempt >= max_attempts {
            error!(
                method = %request.method,
                url = %request.url,
                attempts = attempt,
                error = %message,
                "connection failure, giving up"
            );
            if policy.raise_on_exhausted {
                return Err(ApiError::ConnectionFailure {
                    attempts: attempt,
                    message,
                });
            }
            return Ok(None);
        }

        let delay = policy.delay_after(attempt);
        warn!(
            method = %request.method,
            url = %request.url,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %message,
            "connection failure, retrying"
        );
        sleeper.sleep(delay);
        attempt += 1;
    }
}
