//! Deadline plugin.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::warn;

use super::Plugin;
use crate::{Context, Error, Result};

/// Bounds everything downstream of it by a deadline.
///
/// Placed before a [`crate::Retryer`] it bounds all attempts together;
/// placed after it, each attempt.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    /// A deadline of `duration` for the rest of the pipeline.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Configured deadline.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl Plugin for Timeout {
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let cursor = ctx.cursor();
            let outcome = tokio::time::timeout(self.duration, ctx.next()).await;
            // the abandoned pipeline may have stopped mid-way
            ctx.restore_cursor(cursor);
            match outcome {
                Ok(result) => result,
                Err(_) => {
                    let timeout_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
                    warn!(timeout_ms, "request timed out");
                    ctx.set_response(None);
                    Err(Error::Timeout)
                }
            }
        })
    }
}
