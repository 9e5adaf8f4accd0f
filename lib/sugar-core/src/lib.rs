//! Core types for the sugar fluent HTTP client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Param`] and its wrappers ([`Path`], [`Query`], [`Header`], [`Cookie`],
//!   [`Form`], [`Json`], [`Xml`], [`MultiPart`], [`BasicAuth`], [`Custom`])
//! - [`Value`] and the canonical [`stringify`] conversion
//! - [`Request`] and [`Response`]
//! - the [`Encoder`] chain that applies parameters to a request
//! - the [`Decoder`] chain that reads a response into an [`Out`] target
//! - [`Transporter`], the network collaborator
//! - [`Error`] and [`Result`]

mod codec;
mod decoder;
mod encoder;
mod error;
pub mod mime;
mod multipart;
mod param;
pub mod prelude;
mod request;
mod response;
mod transport;
mod value;

pub use codec::{from_json, from_xml, to_json, to_xml};
pub use decoder::{
    DecodeContext, Decoder, DecoderChain, FileDecoder, FileSink, JsonDecoder, NamedWriter, Out,
    PlainTextDecoder, Slot, XmlDecoder, decode_value, default_decoders,
};
pub use encoder::{
    BasicAuthEncoder, CookieEncoder, EncodeContext, Encoder, EncoderChain, FormEncoder,
    HeaderEncoder, JsonEncoder, MultiPartEncoder, PathEncoder, PlainTextEncoder, QueryEncoder,
    XmlEncoder, default_encoders,
};
pub use error::{Error, Result};
pub use multipart::MultipartWriter;
pub use param::{
    BasicAuth, Cookie, Custom, Field, FileHandle, Form, Header, Json, MultiPart, Param, Path,
    Query, Xml,
};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transporter;
pub use value::{Pairs, Value, stringify};

// Re-export http crate types for methods, status codes and headers
pub use http::{Method, StatusCode, header};
