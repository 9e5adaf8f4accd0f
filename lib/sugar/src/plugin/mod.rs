//! Plugins: middleware wrapped around the transport call.
//!
//! A plugin runs its "before" logic, calls [`Context::next`] to run the rest
//! of the pipeline, then runs its "after" logic. Not calling `next` short
//! circuits the pipeline.
//!
//! Plain functions with the right signature are plugins too:
//!
//! ```
//! use futures_util::future::BoxFuture;
//! use sugar::{Client, Context, Result};
//!
//! fn user_agent(ctx: &mut Context) -> BoxFuture<'_, Result<()>> {
//!     Box::pin(async move {
//!         ctx.request_mut().set_header("User-Agent", "sugar")?;
//!         ctx.next().await
//!     })
//! }
//!
//! let client = Client::builder().plugin(user_agent).build();
//! ```

mod logger;
mod retry;
mod timeout;

use futures_util::future::BoxFuture;

pub use logger::{LogLevel, Logger};
pub use retry::Retryer;
pub use timeout::Timeout;

use crate::{Context, Result};

/// Middleware around the transport call.
pub trait Plugin: Send + Sync {
    /// Handle the request, usually calling `ctx.next()` exactly once.
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>>;
}

impl<F> Plugin for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        self(ctx)
    }
}
