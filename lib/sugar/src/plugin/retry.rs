//! Retry-with-backoff plugin.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::warn;

use super::Plugin;
use crate::{Context, Response, Result};

/// Re-runs the rest of the pipeline on transient failures.
///
/// Runs `ctx.next()` up to `attempts` times and stops early when:
/// - a response with a status below 500 was obtained, or
/// - the attempt failed with an error that is not [transient](crate::Error::is_transient), or
/// - the attempt succeeded (a 5xx response without error also stops, unless
///   [`Retryer::retry_server_errors`] is set).
///
/// Between attempts it sleeps for the current delay, which then grows by
/// `multiplier` up to `max_delay`. The last attempt's outcome is returned.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sugar::Retryer;
///
/// let retryer = Retryer::new(3, Duration::from_millis(100), 2.0, Duration::from_secs(1));
/// assert_eq!(retryer.attempts(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Retryer {
    attempts: u32,
    delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    retry_server_errors: bool,
}

impl Retryer {
    /// Create a retryer; `attempts` of 0 behaves as 1.
    #[must_use]
    pub fn new(attempts: u32, delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            multiplier,
            max_delay,
            retry_server_errors: false,
        }
    }

    /// Also retry 5xx responses that arrived without an error.
    #[must_use]
    pub const fn retry_server_errors(mut self) -> Self {
        self.retry_server_errors = true;
        self
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    fn should_stop(&self, response: Option<&Response>, result: &Result<()>) -> bool {
        if response.is_some_and(|r| r.status() < 500) {
            return true;
        }
        match result {
            Ok(()) => !(self.retry_server_errors && response.is_some_and(Response::is_server_error)),
            Err(err) => !err.is_transient(),
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Plugin for Retryer {
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut delay = self.delay;
            let mut attempt = 1;
            loop {
                let result = ctx.next().await;
                if attempt >= self.attempts || self.should_stop(ctx.response(), &result) {
                    return result;
                }

                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                match (&result, ctx.response()) {
                    (Err(err), _) => warn!(attempt, delay_ms, error = %err, "retrying request"),
                    (Ok(()), Some(response)) => {
                        warn!(attempt, delay_ms, status = response.status(), "retrying request");
                    }
                    (Ok(()), None) => warn!(attempt, delay_ms, "retrying request"),
                }

                tokio::time::sleep(delay).await;
                delay = self.next_delay(delay);
                attempt += 1;
            }
        })
    }
}
