//! Prelude module for convenient imports.
//!
//! ```
//! use sugar_core::prelude::*;
//! ```

pub use crate::{
    BasicAuth, Cookie, Error, FileHandle, Form, Header, Json, Method, MultiPart, NamedWriter, Out,
    Param, Path, Query, Request, Response, Result, Transporter, Value, Xml, params,
};
