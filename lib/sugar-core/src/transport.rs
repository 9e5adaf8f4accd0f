//! The network collaborator.

use futures_util::future::BoxFuture;

use crate::{Request, Response, Result};

/// Performs one HTTP round trip.
///
/// The only capability the pipeline needs from the network layer. The
/// response body is fully buffered.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use futures_util::future::{self, BoxFuture};
/// use http::HeaderMap;
/// use sugar_core::{Request, Response, Result, Transporter};
///
/// /// Answers every request with `204 No Content`.
/// struct NoContent;
///
/// impl Transporter for NoContent {
///     fn execute(&self, _request: Request) -> BoxFuture<'_, Result<Response>> {
///         Box::pin(future::ready(Ok(Response::new(204, HeaderMap::new(), Bytes::new()))))
///     }
/// }
/// ```
pub trait Transporter: Send + Sync {
    /// Sends the request and returns the buffered response.
    fn execute(&self, request: Request) -> BoxFuture<'_, Result<Response>>;
}
