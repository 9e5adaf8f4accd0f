//! Per-request state carried through the plugin pipeline.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::{Plugin, Request, Response, Result, Transporter};

/// The encoded request, the response once there is one, and the pipeline cursor.
///
/// A plugin receives the context, may inspect or change the request, and
/// calls [`Context::next`] to run the rest of the pipeline. When the cursor is
/// past the last plugin, `next` performs the transport round trip.
pub struct Context {
    request: Request,
    response: Option<Response>,
    plugins: Arc<[Arc<dyn Plugin>]>,
    cursor: usize,
    transport: Arc<dyn Transporter>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("plugins", &self.plugins.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a context positioned before the first plugin.
    #[must_use]
    pub fn new(
        request: Request,
        transport: Arc<dyn Transporter>,
        plugins: Arc<[Arc<dyn Plugin>]>,
    ) -> Self {
        Self {
            request,
            response: None,
            plugins,
            cursor: 0,
            transport,
        }
    }

    /// The request that will be sent.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the request that will be sent.
    pub const fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The response of the latest round trip, if it succeeded.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Replaces the response, e.g. from a plugin that answers without
    /// calling [`Context::next`].
    pub fn set_response(&mut self, response: Option<Response>) {
        self.response = response;
    }

    /// Index of the next plugin to run.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) const fn restore_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    /// Runs the rest of the pipeline.
    ///
    /// Invokes the plugin at the cursor with the cursor advanced past it, then
    /// restores the cursor, so calling `next` again from the same plugin runs
    /// every downstream plugin and the transport again. With no plugin left,
    /// performs one round trip and stores its response; on error the stored
    /// response is cleared.
    pub fn next(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(plugin) = self.plugins.get(self.cursor).cloned() {
                let cursor = self.cursor;
                self.cursor += 1;
                let result = plugin.handle(self).await;
                self.cursor = cursor;
                return result;
            }

            let transport = Arc::clone(&self.transport);
            debug!(method = %self.request.method(), url = %self.request.url(), "round trip");
            match transport.execute(self.request.clone()).await {
                Ok(response) => {
                    self.response = Some(response);
                    Ok(())
                }
                Err(err) => {
                    self.response = None;
                    Err(err)
                }
            }
        })
    }

    /// Consume into the request and the final response.
    #[must_use]
    pub fn into_parts(self) -> (Request, Option<Response>) {
        (self.request, self.response)
    }
}
