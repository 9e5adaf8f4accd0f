//! Prelude module for convenient imports.
//!
//! ```
//! use sugar::prelude::*;
//!
//! let client = Client::builder().plugin(Logger::new()).build();
//! # drop(client);
//! ```

pub use crate::{
    BasicAuth, Client, Context, Cookie, Error, FileHandle, Form, Header, Json, Logger, Method,
    MultiPart, NamedWriter, Out, Param, Path, Plugin, Query, Reply, Result, Retryer, Timeout, Xml,
    params,
};
pub use serde::{Deserialize, Serialize};
