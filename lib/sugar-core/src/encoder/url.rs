//! Encoders that rewrite the request URL.

use futures_util::future::BoxFuture;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::{EncodeContext, Encoder, EncoderChain, done};
use crate::{Pairs, Param, Result, stringify};

/// Query component encoding: everything but unreserved characters, so a
/// space becomes `%20` rather than `+`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Substitutes `:name` placeholders in the URL path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEncoder;

impl Encoder for PathEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Path(path)) = ctx.param() else {
            return chain.next(ctx);
        };
        let expanded = expand_path(ctx.request().url().path(), path.pairs());
        ctx.request_mut().url_mut().set_path(&expanded);
        done(Ok(()))
    }
}

/// Replaces each `:token` (up to the next `/`) whose token is a key of `vars`.
///
/// Unknown tokens are kept as written.
fn expand_path(template: &str, vars: &Pairs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(':') {
        let (before, placeholder) = rest.split_at(start);
        out.push_str(before);

        let token_end = placeholder.find('/').unwrap_or(placeholder.len());
        let (placeholder, tail) = placeholder.split_at(token_end);
        let token = placeholder.trim_start_matches(':');

        match vars.get(token) {
            Some(value) if !token.is_empty() => out.push_str(&stringify(value)),
            _ => out.push_str(placeholder),
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Appends query entries, keeping any query already on the URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEncoder;

impl Encoder for QueryEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Query(query)) = ctx.param() else {
            return chain.next(ctx);
        };

        let encoded = query
            .pairs()
            .expanded()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY_VALUE),
                    utf8_percent_encode(&value, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        if encoded.is_empty() {
            return done(Ok(()));
        }

        let url = ctx.request_mut().url_mut();
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        };
        url.set_query(Some(&merged));
        done(Ok(()))
    }
}
