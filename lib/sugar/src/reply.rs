//! The outcome of a request, decoded on demand.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{DecodeContext, Decoder, Error, Out, Request, Response, Result, decode_value};

/// A response (or the error that replaced it) awaiting decoding.
///
/// Every `read*` method consumes the reply: the buffered body is released
/// exactly once, whatever the decode outcome. If the request failed, the
/// failure is returned and no decoder runs.
pub struct Reply {
    request: Option<Request>,
    result: Result<Response>,
    decoders: Arc<[Arc<dyn Decoder>]>,
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("request", &self.request)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Reply {
    pub(crate) fn new(
        request: Option<Request>,
        result: Result<Response>,
        decoders: Arc<[Arc<dyn Decoder>]>,
    ) -> Self {
        Self {
            request,
            result,
            decoders,
        }
    }

    /// The request as sent, if encoding succeeded.
    #[must_use]
    pub const fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// The error that replaced the response, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// Status code, if a response was obtained.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().map(Response::status)
    }

    /// The raw response, bypassing the decoders.
    pub fn raw(self) -> Result<Response> {
        self.result
    }

    /// Runs the decoder chain into `out`, returning the response head.
    pub async fn read(self, out: Out<'_>) -> Result<Response<()>> {
        let response = self.result?;
        DecodeContext::new(response, out)
            .with_request(self.request)
            .run(&self.decoders)
            .await
    }

    /// Runs the decoder chain into a fresh `T`.
    pub async fn read_value<T: DeserializeOwned + Send>(self) -> Result<(T, Response<()>)> {
        let response = self.result?;
        decode_value(&self.decoders, response, self.request).await
    }

    /// The body as text, bypassing the decoders.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn read_text(self) -> Result<(String, Response<()>)> {
        let (body, head) = self.read_bytes()?;
        Ok((String::from_utf8_lossy(&body).into_owned(), head))
    }

    /// The raw body, bypassing the decoders.
    pub fn read_bytes(self) -> Result<(Bytes, Response<()>)> {
        let (status, headers, body) = self.result?.into_parts();
        Ok((body, Response::new(status, headers, ())))
    }
}
