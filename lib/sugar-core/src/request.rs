//! The request under construction.
//!
//! Encoders mutate a [`Request`] in place; plugins may inspect or alter it
//! before the transporter sends it.
//!
//! # Example
//!
//! ```
//! use sugar_core::{Method, Request};
//!
//! let request = Request::builder(Method::GET, "https://api.example.com/books".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .build()
//!     .unwrap();
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{Error, Method, Result, mime};

/// An HTTP request with method, URL, header multimap, and optional body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Creates an empty request.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder {
            request: Ok(Self::new(method, url)),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Mutable access to the URL.
    pub const fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Appends a header value, keeping existing values.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Sets a header, replacing existing values.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Sets `Content-Type` unless the request already has one.
    pub fn set_default_content_type(&mut self, content_type: &str) -> Result<()> {
        if self.headers.contains_key(mime::CONTENT_TYPE) {
            return Ok(());
        }
        self.set_header(mime::CONTENT_TYPE, content_type)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid_request(format!("header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_request(format!("header '{name}' value: {e}")))?;
    Ok((name, value))
}

/// Builder for constructing [`Request`] instances outside the encoder chain.
///
/// The first invalid header is reported by [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    request: Result<Request>,
}

impl RequestBuilder {
    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Ok(request) = &mut self.request
            && let Err(err) = request.append_header(name, value)
        {
            self.request = Err(err);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        if let Ok(request) = &mut self.request {
            request.set_body(body);
        }
        self
    }

    /// Builds the [`Request`].
    pub fn build(self) -> Result<Request> {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/books").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::POST, url())
            .header("Accept", "application/json")
            .body("hello")
            .build()
            .expect("request");

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "https://api.example.com/books");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.body().map(Bytes::as_ref), Some(&b"hello"[..]));
    }

    #[test]
    fn request_builder_rejects_bad_header() {
        let result = Request::builder(Method::GET, url())
            .header("Bad Name", "x")
            .build();
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn append_header_is_additive() {
        let mut request = Request::new(Method::GET, url());
        request.append_header("X-Tag", "a").expect("header");
        request.append_header("X-Tag", "b").expect("header");

        let values: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn default_content_type_keeps_existing() {
        let mut request = Request::new(Method::POST, url());
        request.set_header("Content-Type", "text/csv").expect("header");
        request
            .set_default_content_type(mime::JSON)
            .expect("content type");
        assert_eq!(request.header("content-type"), Some("text/csv"));
    }
}
