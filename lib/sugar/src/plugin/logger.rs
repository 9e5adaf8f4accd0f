//! Request/response logging plugin.

use std::fmt::Write as _;
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::HeaderMap;
use tracing::{Instrument, debug, info, info_span, warn};

use super::Plugin;
use crate::{Context, Request, Response, Result};

/// Verbosity of the [`Logger`] plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Full request and response dumps at debug level, plus the summary.
    #[default]
    Debug,
    /// Summary only.
    Info,
}

/// Logs every request and its outcome with `tracing`.
///
/// By default the request is dumped before the rest of the pipeline runs and
/// the response after it returns, whether or not it returned an error.
/// [`Logger::summary`] keeps only the one-line summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// A logger dumping requests and responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`Logger::new`].
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// A logger emitting one summary per request.
    #[must_use]
    pub fn summary() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl Plugin for Logger {
    fn handle<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        let method = ctx.request().method().clone();
        let url = ctx.request().url().to_string();
        let span = info_span!("http_request", %method, %url);
        let level = self.level;

        Box::pin(
            async move {
                if level == LogLevel::Debug {
                    debug!(dump = %dump_request(ctx.request()), "sending request");
                } else {
                    info!("sending request");
                }

                let start = Instant::now();
                let result = ctx.next().await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                if let Some(response) = ctx.response() {
                    if level == LogLevel::Debug {
                        debug!(dump = %dump_response(response), "received response");
                    }
                    let status = response.status();
                    if response.is_success() {
                        info!(status, elapsed_ms, "request completed");
                    } else {
                        warn!(status, elapsed_ms, "request failed with HTTP error");
                    }
                }
                if let Err(err) = &result {
                    warn!(error = %err, elapsed_ms, "request failed");
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Start line, headers and body of a request, HTTP/1.1 style.
#[must_use]
fn dump_request(request: &Request) -> String {
    let mut dump = format!("{} {} HTTP/1.1\r\n", request.method(), request.url());
    write_headers(&mut dump, request.headers());
    if let Some(body) = request.body() {
        dump.push_str(&String::from_utf8_lossy(body));
    }
    dump
}

/// Status line, headers and body of a response, HTTP/1.1 style.
#[must_use]
fn dump_response(response: &Response) -> String {
    let reason = http::StatusCode::from_u16(response.status())
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default();
    let mut dump = format!("HTTP/1.1 {} {reason}\r\n", response.status());
    write_headers(&mut dump, response.headers());
    dump.push_str(&String::from_utf8_lossy(response.body()));
    dump
}

fn write_headers(dump: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = write!(dump, "{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
    }
    dump.push_str("\r\n");
}
