//! Encoder chain: applies each request parameter to the request under construction.
//!
//! Every parameter is offered to the encoders in order. An encoder either
//! claims it (mutating the request and returning its result) or hands it on
//! with [`EncoderChain::next`]. A parameter that falls off the end of the
//! chain is reported as [`Error::EncoderNotFound`].
//!
//! # Writing an encoder
//!
//! ```
//! use futures_util::future::{self, BoxFuture};
//! use sugar_core::{EncodeContext, Encoder, EncoderChain, Param, Result};
//!
//! struct ApiKey(&'static str);
//!
//! struct ApiKeyEncoder;
//!
//! impl Encoder for ApiKeyEncoder {
//!     fn encode<'a>(
//!         &'a self,
//!         ctx: &'a mut EncodeContext,
//!         chain: EncoderChain<'a>,
//!     ) -> BoxFuture<'a, Result<()>> {
//!         let Some(key) = ctx.custom::<ApiKey>().map(|k| k.0) else {
//!             return chain.next(ctx);
//!         };
//!         Box::pin(future::ready(ctx.request_mut().set_header("X-Api-Key", key)))
//!     }
//! }
//! ```

mod auth;
mod body;
mod url;

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};

pub use auth::{BasicAuthEncoder, CookieEncoder, HeaderEncoder};
pub use body::{FormEncoder, JsonEncoder, MultiPartEncoder, PlainTextEncoder, XmlEncoder};
pub use url::{PathEncoder, QueryEncoder};

use crate::{Error, Param, Request, Result};

/// Applies one kind of parameter to a request.
pub trait Encoder: Send + Sync {
    /// Encode the current parameter, or delegate with `chain.next(ctx)`.
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Per-request state shared by the encoders.
///
/// Holds the request under construction and the full parameter list, so an
/// encoder can look at sibling parameters.
#[derive(Debug)]
pub struct EncodeContext {
    request: Request,
    params: Arc<[Param]>,
    index: usize,
    body_from: Option<usize>,
}

impl EncodeContext {
    /// Creates a context positioned on the first parameter.
    #[must_use]
    pub fn new(request: Request, params: Arc<[Param]>) -> Self {
        Self {
            request,
            params,
            index: 0,
            body_from: None,
        }
    }

    /// Request under construction.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the request under construction.
    pub const fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Every parameter of the request.
    #[must_use]
    pub fn params(&self) -> &Arc<[Param]> {
        &self.params
    }

    /// Position of the parameter being encoded.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The parameter being encoded.
    #[must_use]
    pub fn param(&self) -> Option<&Param> {
        self.params.get(self.index)
    }

    /// The parameter being encoded, as a shared handle independent of `self`.
    #[must_use]
    pub fn current(&self) -> Option<Param> {
        self.param().cloned()
    }

    /// The current parameter's custom value, if it is a `T`.
    #[must_use]
    pub fn custom<T: std::any::Any>(&self) -> Option<&T> {
        match self.param()? {
            Param::Custom(custom) => custom.downcast_ref(),
            _ => None,
        }
    }

    /// Installs the request body on behalf of the current parameter.
    ///
    /// Fails with [`Error::BodyAlreadySet`] if an earlier parameter already
    /// produced a body. The content type is only set when absent.
    pub fn set_body(&mut self, body: impl Into<bytes::Bytes>, content_type: &str) -> Result<()> {
        if self.body_from.is_some() {
            return Err(Error::BodyAlreadySet { index: self.index });
        }
        self.request.set_default_content_type(content_type)?;
        self.request.set_body(body);
        self.body_from = Some(self.index);
        Ok(())
    }

    /// Consume into the encoded request.
    #[must_use]
    pub fn into_request(self) -> Request {
        self.request
    }

    /// Runs every parameter through `encoders`, in order.
    ///
    /// Stops at the first error; nothing applied by earlier parameters is
    /// rolled back.
    pub async fn encode_all(&mut self, encoders: &[Arc<dyn Encoder>]) -> Result<()> {
        for index in 0..self.params.len() {
            self.index = index;
            EncoderChain::new(encoders).next(self).await?;
        }
        Ok(())
    }
}

/// Cursor over the encoders not yet consulted for the current parameter.
#[derive(Clone, Copy)]
pub struct EncoderChain<'a> {
    remaining: &'a [Arc<dyn Encoder>],
}

impl<'a> EncoderChain<'a> {
    /// A chain starting at the first encoder.
    #[must_use]
    pub const fn new(encoders: &'a [Arc<dyn Encoder>]) -> Self {
        Self {
            remaining: encoders,
        }
    }

    /// Offers the current parameter to the next encoder.
    pub fn next(self, ctx: &'a mut EncodeContext) -> BoxFuture<'a, Result<()>> {
        match self.remaining.split_first() {
            Some((encoder, rest)) => encoder.encode(ctx, EncoderChain { remaining: rest }),
            None => {
                let kind = ctx.param().map_or("none", Param::kind);
                Box::pin(future::ready(Err(Error::EncoderNotFound {
                    index: ctx.index(),
                    kind,
                })))
            }
        }
    }
}

impl std::fmt::Debug for EncoderChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderChain")
            .field("remaining", &self.remaining.len())
            .finish()
    }
}

/// The built-in encoders, one per [`Param`] variant except `Custom`.
#[must_use]
pub fn default_encoders() -> Vec<Arc<dyn Encoder>> {
    vec![
        Arc::new(PathEncoder),
        Arc::new(QueryEncoder),
        Arc::new(HeaderEncoder),
        Arc::new(CookieEncoder),
        Arc::new(FormEncoder),
        Arc::new(JsonEncoder),
        Arc::new(XmlEncoder),
        Arc::new(MultiPartEncoder),
        Arc::new(BasicAuthEncoder),
        Arc::new(PlainTextEncoder),
    ]
}

/// Resolves the encoder future for a synchronous encoding step.
pub(crate) fn done<'a>(result: Result<()>) -> BoxFuture<'a, Result<()>> {
    Box::pin(future::ready(result))
}
