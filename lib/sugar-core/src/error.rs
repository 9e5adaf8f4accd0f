//! Error types for sugar.

use derive_more::{Display, Error, From};

/// Main error type for sugar operations.
///
/// Variants fall into four groups: request building (`InvalidUrl`,
/// `InvalidRequest`, `EncoderNotFound`, `BodyAlreadySet`), encoding
/// (`JsonSerialization`, `XmlSerialization`, `Io`), transport (`Connection`,
/// `Tls`, `Timeout`) and decoding (`JsonDeserialization`,
/// `XmlDeserialization`, `DecoderNotFound`).
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// No encoder in the chain claimed a parameter.
    #[display("encoder not found for parameter #{index} ({kind})")]
    #[from(skip)]
    EncoderNotFound {
        /// Position of the parameter in the request's parameter list.
        index: usize,
        /// Kind of the unclaimed parameter.
        kind: &'static str,
    },

    /// No decoder in the chain accepted the response.
    #[display("decoder not found for content type '{content_type}'")]
    #[from(skip)]
    DecoderNotFound {
        /// Joined `Content-Type` values of the response, empty if absent.
        content_type: String,
    },

    /// A second body-producing parameter was supplied.
    #[display("request body already set, parameter #{index} would overwrite it")]
    #[from(skip)]
    BodyAlreadySet {
        /// Position of the rejected parameter.
        index: usize,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "books[0].name").
        path: String,
        /// Error message.
        message: String,
    },

    /// XML serialization error.
    #[display("XML serialization error: {_0}")]
    #[from(skip)]
    XmlSerialization(#[error(not(source))] String),

    /// XML deserialization error.
    #[display("XML deserialization error: {_0}")]
    #[from(skip)]
    XmlDeserialization(#[error(not(source))] String),

    /// I/O failure while streaming file content in or out.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for network-level failures worth retrying.
    ///
    /// Exactly [`Error::Connection`] (refused, reset, DNS failure, broken
    /// body stream) and [`Error::Timeout`]. TLS, encoding and decoding
    /// errors are never transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}
