//! Decoder chain: turns a buffered response body into a caller-supplied target.
//!
//! Each decoder looks at the response's `Content-Type` values and the shape
//! of the [`Out`] target. If both fit it decodes; otherwise it hands the
//! response to the next decoder with [`DecoderChain::next`]. A response no
//! decoder accepts is reported as [`Error::DecoderNotFound`].
//!
//! The default chain is JSON, XML, plain text, then file download.
//!
//! # Example
//!
//! ```
//! # tokio_test_block(async {
//! use bytes::Bytes;
//! use http::{HeaderMap, HeaderValue};
//! use serde::Deserialize;
//! use sugar_core::{DecodeContext, Out, Response, default_decoders};
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Book {
//!     name: String,
//! }
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("content-type", HeaderValue::from_static("application/json"));
//! let response = Response::new(200, headers, Bytes::from_static(br#"[{"name":"bookA"}]"#));
//!
//! let mut books: Vec<Book> = Vec::new();
//! let head = DecodeContext::new(response, Out::value(&mut books))
//!     .run(&default_decoders())
//!     .await
//!     .unwrap();
//! assert_eq!(head.status(), 200);
//! assert_eq!(books[0].name, "bookA");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::{self, BoxFuture};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{Error, Request, Response, Result, from_json, from_xml, mime};

/// A typed decode target, filled from a JSON or XML document.
///
/// Implemented for every `DeserializeOwned + Send` type.
pub trait Slot: Send {
    /// Replaces the target with the value parsed from a JSON document.
    fn fill_json(&mut self, body: &[u8]) -> Result<()>;

    /// Replaces the target with the value parsed from an XML document.
    fn fill_xml(&mut self, body: &[u8]) -> Result<()>;
}

impl<T: DeserializeOwned + Send> Slot for T {
    fn fill_json(&mut self, body: &[u8]) -> Result<()> {
        *self = from_json(body)?;
        Ok(())
    }

    fn fill_xml(&mut self, body: &[u8]) -> Result<()> {
        *self = from_xml(body)?;
        Ok(())
    }
}

/// A named byte sink for file downloads.
///
/// The name's extension selects the content type the file decoder accepts.
pub trait FileSink: AsyncWrite + Send + Unpin {
    /// Name of the sink, usually a file name.
    fn name(&self) -> &str;
}

/// Pairs a name with any async writer.
///
/// # Example
///
/// ```
/// use sugar_core::{FileSink, NamedWriter};
///
/// let sink = NamedWriter::new("cover.png", Vec::<u8>::new());
/// assert_eq!(sink.name(), "cover.png");
/// ```
#[derive(Debug)]
pub struct NamedWriter<W> {
    name: String,
    writer: W,
}

impl<W> NamedWriter<W> {
    /// Wraps `writer` under `name`.
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    /// The wrapped writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume into the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl NamedWriter<tokio::fs::File> {
    /// Creates (or truncates) a file on disk, named after its last path component.
    pub async fn create(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::create(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, file))
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for NamedWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().writer).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().writer).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().writer).poll_shutdown(cx)
    }
}

impl<W: AsyncWrite + Send + Unpin> FileSink for NamedWriter<W> {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Where a decoded body goes.
pub enum Out<'a> {
    /// A typed value, for JSON and XML.
    Value(&'a mut dyn Slot),
    /// A string, for plain text.
    Text(&'a mut String),
    /// A byte sink, for file downloads.
    File(&'a mut dyn FileSink),
}

impl<'a> Out<'a> {
    /// Decode into a typed value.
    pub fn value<T: Slot>(target: &'a mut T) -> Self {
        Self::Value(target)
    }

    /// Decode into a string.
    pub fn text(target: &'a mut String) -> Self {
        Self::Text(target)
    }

    /// Write the body into a named sink.
    pub fn file<F: FileSink>(sink: &'a mut F) -> Self {
        Self::File(sink)
    }

    /// Returns `true` for a typed value target.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` for a string target.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Name of the file sink, if this is one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::File(sink) => Some(sink.name()),
            Self::Value(_) | Self::Text(_) => None,
        }
    }
}

impl std::fmt::Debug for Out<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Out::Value"),
            Self::Text(_) => f.write_str("Out::Text"),
            Self::File(sink) => f.debug_tuple("Out::File").field(&sink.name()).finish(),
        }
    }
}

/// Decodes a response into an [`Out`] target.
pub trait Decoder: Send + Sync {
    /// Decode the response, or delegate with `chain.next(ctx)`.
    fn decode<'a>(
        &'a self,
        ctx: &'a mut DecodeContext<'_>,
        chain: DecoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// A response together with its decode target.
///
/// Owns the response, so the body is released when the context is consumed
/// by [`DecodeContext::run`], whatever the outcome.
#[derive(Debug)]
pub struct DecodeContext<'o> {
    response: Response,
    out: Out<'o>,
    request: Option<Request>,
}

impl<'o> DecodeContext<'o> {
    /// Creates a context for `response`.
    #[must_use]
    pub fn new(response: Response, out: Out<'o>) -> Self {
        Self {
            response,
            out,
            request: None,
        }
    }

    /// Attaches the request that produced the response, for diagnostics.
    #[must_use]
    pub fn with_request(mut self, request: Option<Request>) -> Self {
        self.request = request;
        self
    }

    /// The response being decoded.
    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }

    /// The request that produced the response, if known.
    #[must_use]
    pub const fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// The decode target.
    #[must_use]
    pub const fn out(&self) -> &Out<'o> {
        &self.out
    }

    /// The body and the target, borrowed together.
    pub fn parts(&mut self) -> (&Bytes, &mut Out<'o>) {
        (self.response.body(), &mut self.out)
    }

    /// Runs the chain and returns the response head.
    pub async fn run(mut self, decoders: &[Arc<dyn Decoder>]) -> Result<Response<()>> {
        let result = DecoderChain::new(decoders).next(&mut self).await;
        let head = self.response.map_body(drop);
        result.map(|()| head)
    }
}

/// Cursor over the decoders not yet consulted.
#[derive(Clone, Copy)]
pub struct DecoderChain<'a> {
    remaining: &'a [Arc<dyn Decoder>],
}

impl<'a> DecoderChain<'a> {
    /// A chain starting at the first decoder.
    #[must_use]
    pub const fn new(decoders: &'a [Arc<dyn Decoder>]) -> Self {
        Self {
            remaining: decoders,
        }
    }

    /// Offers the response to the next decoder.
    pub fn next(self, ctx: &'a mut DecodeContext<'_>) -> BoxFuture<'a, Result<()>> {
        match self.remaining.split_first() {
            Some((decoder, rest)) => decoder.decode(ctx, DecoderChain { remaining: rest }),
            None => {
                let content_type = ctx.response().content_types().collect::<Vec<_>>().join(", ");
                Box::pin(future::ready(Err(Error::DecoderNotFound { content_type })))
            }
        }
    }
}

impl std::fmt::Debug for DecoderChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderChain")
            .field("remaining", &self.remaining.len())
            .finish()
    }
}

fn done<'a>(result: Result<()>) -> BoxFuture<'a, Result<()>> {
    Box::pin(future::ready(result))
}

/// `application/json` into a typed value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<'a>(
        &'a self,
        ctx: &'a mut DecodeContext<'_>,
        chain: DecoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        if !ctx.response().has_content_type(mime::JSON) {
            return chain.next(ctx);
        }
        let (body, Out::Value(slot)) = ctx.parts() else {
            return chain.next(ctx);
        };
        done(slot.fill_json(body))
    }
}

/// `application/xml` into a typed value.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl Decoder for XmlDecoder {
    fn decode<'a>(
        &'a self,
        ctx: &'a mut DecodeContext<'_>,
        chain: DecoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        if !ctx.response().has_content_type(mime::XML) {
            return chain.next(ctx);
        }
        let (body, Out::Value(slot)) = ctx.parts() else {
            return chain.next(ctx);
        };
        done(slot.fill_xml(body))
    }
}

/// `text/plain`, or no `Content-Type` at all, into a string.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextDecoder;

impl Decoder for PlainTextDecoder {
    fn decode<'a>(
        &'a self,
        ctx: &'a mut DecodeContext<'_>,
        chain: DecoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let response = ctx.response();
        let untyped = response.content_types().next().is_none();
        if !untyped && !response.has_content_type(mime::PLAIN_TEXT) {
            return chain.next(ctx);
        }
        let (body, Out::Text(text)) = ctx.parts() else {
            return chain.next(ctx);
        };
        **text = String::from_utf8_lossy(body).into_owned();
        done(Ok(()))
    }
}

/// Streams the body into a [`FileSink`].
///
/// Accepts responses whose content type contains the MIME type guessed from
/// the sink's name; unknown extensions accept `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl Decoder for FileDecoder {
    fn decode<'a>(
        &'a self,
        ctx: &'a mut DecodeContext<'_>,
        chain: DecoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(name) = ctx.out().file_name() else {
            return chain.next(ctx);
        };
        if !ctx.response().has_content_type(mime::from_file_name(name)) {
            return chain.next(ctx);
        }
        Box::pin(async move {
            if let (body, Out::File(sink)) = ctx.parts() {
                sink.write_all(body).await?;
                sink.flush().await?;
            }
            Ok(())
        })
    }
}

/// The built-in decoders, in lookup order.
#[must_use]
pub fn default_decoders() -> Vec<Arc<dyn Decoder>> {
    vec![
        Arc::new(JsonDecoder),
        Arc::new(XmlDecoder),
        Arc::new(PlainTextDecoder),
        Arc::new(FileDecoder),
    ]
}

struct Decoded<T>(Option<T>);

impl<T: DeserializeOwned + Send> Slot for Decoded<T> {
    fn fill_json(&mut self, body: &[u8]) -> Result<()> {
        self.0 = Some(from_json(body)?);
        Ok(())
    }

    fn fill_xml(&mut self, body: &[u8]) -> Result<()> {
        self.0 = Some(from_xml(body)?);
        Ok(())
    }
}

/// Decodes `response` into a fresh `T`.
///
/// Fails with [`Error::DecoderNotFound`] if no decoder produced a value.
pub async fn decode_value<T: DeserializeOwned + Send>(
    decoders: &[Arc<dyn Decoder>],
    response: Response,
    request: Option<Request>,
) -> Result<(T, Response<()>)> {
    let mut decoded = Decoded(None);
    let head = DecodeContext::new(response, Out::Value(&mut decoded))
        .with_request(request)
        .run(decoders)
        .await?;
    match decoded.0 {
        Some(value) => Ok((value, head)),
        None => Err(Error::DecoderNotFound {
            content_type: head.content_types().collect::<Vec<_>>().join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use http::{HeaderMap, HeaderValue};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Book {
        name: String,
    }

    fn response(content_type: Option<&'static str>, body: &'static [u8]) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(mime::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Response::new(200, headers, Bytes::from_static(body))
    }

    #[tokio::test]
    async fn json_into_typed_value() {
        let mut books: Vec<Book> = Vec::new();
        let head = DecodeContext::new(
            response(Some("application/json; charset=utf-8"), br#"[{"name":"bookA"}]"#),
            Out::value(&mut books),
        )
        .run(&default_decoders())
        .await
        .expect("decode");

        check!(head.status() == 200);
        check!(books == [Book { name: "bookA".into() }]);
    }

    #[tokio::test]
    async fn json_error_names_the_field() {
        let result = decode_value::<Vec<Book>>(
            &default_decoders(),
            response(Some(mime::JSON), br#"[{"name":1}]"#),
            None,
        )
        .await;
        let_assert!(Err(Error::JsonDeserialization { path, .. }) = result);
        check!(path == "[0].name");
    }

    #[tokio::test]
    async fn xml_into_typed_value() {
        let (book, _) = decode_value::<Book>(
            &default_decoders(),
            response(Some("Application/XML"), b"<book><name>bookA</name></book>"),
            None,
        )
        .await
        .expect("decode");
        check!(book.name == "bookA");
    }

    #[tokio::test]
    async fn text_with_and_without_content_type() {
        let mut text = String::new();
        DecodeContext::new(response(Some("text/plain"), b"hello"), Out::text(&mut text))
            .run(&default_decoders())
            .await
            .expect("decode");
        check!(text == "hello");

        let mut text = String::new();
        DecodeContext::new(response(None, b"untyped"), Out::text(&mut text))
            .run(&default_decoders())
            .await
            .expect("decode");
        check!(text == "untyped");
    }

    #[tokio::test]
    async fn wrong_target_shape_falls_through() {
        let mut text = String::new();
        let result = DecodeContext::new(response(Some(mime::JSON), b"{}"), Out::text(&mut text))
            .run(&default_decoders())
            .await;
        let_assert!(Err(Error::DecoderNotFound { content_type }) = result);
        check!(content_type == mime::JSON);
    }

    #[tokio::test]
    async fn unknown_content_type_is_not_found() {
        let result = decode_value::<Book>(
            &default_decoders(),
            response(Some("image/png"), b"\x89PNG"),
            None,
        )
        .await;
        let_assert!(Err(Error::DecoderNotFound { content_type }) = result);
        check!(content_type == "image/png");
    }

    #[tokio::test]
    async fn file_sink_receives_body() {
        let mut sink = NamedWriter::new("cover.png", Vec::new());
        DecodeContext::new(response(Some("image/png"), b"\x89PNG"), Out::file(&mut sink))
            .run(&default_decoders())
            .await
            .expect("decode");
        check!(sink.into_inner() == b"\x89PNG");
    }

    #[tokio::test]
    async fn file_sink_without_known_extension_accepts_octet_stream() {
        let mut sink = NamedWriter::new("blob", Vec::new());
        DecodeContext::new(
            response(Some(mime::OCTET_STREAM), b"\x00\x01"),
            Out::file(&mut sink),
        )
        .run(&default_decoders())
        .await
        .expect("decode");
        check!(sink.get_ref().as_slice() == b"\x00\x01");

        let mut sink = NamedWriter::new("blob", Vec::new());
        let result = DecodeContext::new(response(Some("image/png"), b"\x89"), Out::file(&mut sink))
            .run(&default_decoders())
            .await;
        check!(matches!(result, Err(Error::DecoderNotFound { .. })));
    }

    struct Shouting;

    impl Decoder for Shouting {
        fn decode<'a>(
            &'a self,
            ctx: &'a mut DecodeContext<'_>,
            chain: DecoderChain<'a>,
        ) -> BoxFuture<'a, Result<()>> {
            let (body, Out::Text(text)) = ctx.parts() else {
                return chain.next(ctx);
            };
            **text = String::from_utf8_lossy(body).to_uppercase();
            done(Ok(()))
        }
    }

    #[tokio::test]
    async fn earlier_decoder_wins() {
        let mut decoders: Vec<Arc<dyn Decoder>> = vec![Arc::new(Shouting)];
        decoders.extend(default_decoders());

        let mut text = String::new();
        DecodeContext::new(response(Some("text/plain"), b"hello"), Out::text(&mut text))
            .run(&decoders)
            .await
            .expect("decode");
        check!(text == "HELLO");

        let (book, _) = decode_value::<Book>(
            &decoders,
            response(Some(mime::JSON), br#"{"name":"bookA"}"#),
            None,
        )
        .await
        .expect("decode");
        check!(book.name == "bookA");
    }
}
