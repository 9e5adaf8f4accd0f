//! Fluent HTTP client for Rust.
//!
//! A request is a method, a URL and a list of heterogeneous parameters. The
//! parameters run through a chain of encoders, the encoded request through a
//! pipeline of plugins wrapped around the transport, and the response through
//! a chain of decoders.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use serde::{Deserialize, Serialize};
//! use sugar::{Client, Json, Logger, Path, Retryer, params};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Book {
//!     name: String,
//! }
//!
//! # async fn run() -> sugar::Result<()> {
//! let client = Client::builder()
//!     .plugin(Logger::new())
//!     .plugin(Retryer::new(3, Duration::from_millis(200), 2.0, Duration::from_secs(2)))
//!     .build();
//!
//! let (created, head) = client
//!     .post(
//!         "https://api.example.com/shelves/:shelf/books",
//!         params![
//!             Path::new().add("shelf", 7),
//!             Json::new(Book { name: "bookA".into() }),
//!         ],
//!     )
//!     .await
//!     .read_value::<Book>()
//!     .await?;
//! println!("{} -> {}", created.name, head.status());
//! # Ok(())
//! # }
//! ```
//!
//! The free functions ([`get`], [`post`], [`apply`], ...) go through a lazily
//! created [`default_client`].

mod client;
mod config;
mod connector;
mod context;
mod global;
pub mod plugin;
pub mod prelude;
mod reply;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{DEFAULT_USER_AGENT, TransportConfig, TransportConfigBuilder};
pub use context::Context;
pub use global::{
    apply, default_client, default_decoders, default_encoders, delete, get, patch, post, put,
    reset, send, use_plugin,
};
pub use plugin::{LogLevel, Logger, Plugin, Retryer, Timeout};
pub use reply::Reply;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for transport layering
pub use tower;

// Re-export core types
pub use sugar_core::{
    BasicAuth, BasicAuthEncoder, Cookie, CookieEncoder, Custom, DecodeContext, Decoder,
    DecoderChain, EncodeContext, Encoder, EncoderChain, Error, Field, FileDecoder, FileHandle,
    FileSink, Form, FormEncoder, Header, HeaderEncoder, Json, JsonDecoder, JsonEncoder, MultiPart,
    MultiPartEncoder, MultipartWriter, NamedWriter, Out, Pairs, Param, Path, PathEncoder,
    PlainTextDecoder, PlainTextEncoder, Query, QueryEncoder, Request, RequestBuilder, Response,
    Result, Slot, Transporter, Value, Xml, XmlDecoder, XmlEncoder, decode_value, from_json,
    from_xml, mime, params, stringify, to_json, to_xml,
};

// Fresh built-in handler lists, as opposed to the default client's
pub use sugar_core::{default_decoders as builtin_decoders, default_encoders as builtin_encoders};

// Re-export http types for methods, status codes and headers
pub use sugar_core::{Method, StatusCode, header};
