//! Body-producing encoders.
//!
//! At most one body-producing parameter is allowed per request; a second one
//! fails with [`crate::Error::BodyAlreadySet`].

use futures_util::future::BoxFuture;
use url::form_urlencoded;

use super::{EncodeContext, Encoder, EncoderChain, done};
use crate::{Field, MultipartWriter, Param, Result, mime, stringify};

/// `application/x-www-form-urlencoded` body; list values repeat the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoder;

impl Encoder for FormEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Form(form)) = ctx.param() else {
            return chain.next(ctx);
        };
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.pairs().expanded())
            .finish();
        done(ctx.set_body(body, mime::FORM))
    }
}

/// JSON body, `application/json; charset=UTF-8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Json(json)) = ctx.param() else {
            return chain.next(ctx);
        };
        let result = json.encode().and_then(|body| ctx.set_body(body, mime::JSON_UTF8));
        done(result)
    }
}

/// XML body, `application/xml; charset=UTF-8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEncoder;

impl Encoder for XmlEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Xml(xml)) = ctx.param() else {
            return chain.next(ctx);
        };
        let result = xml.encode().and_then(|body| ctx.set_body(body, mime::XML_UTF8));
        done(result)
    }
}

/// Bare string body, `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextEncoder;

impl Encoder for PlainTextEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Text(text)) = ctx.param() else {
            return chain.next(ctx);
        };
        let body = text.clone();
        done(ctx.set_body(body, mime::PLAIN_TEXT))
    }
}

/// `multipart/form-data` body.
///
/// File parts are read in full before the body is installed; an I/O error
/// aborts the request and leaves it without a body.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiPartEncoder;

impl Encoder for MultiPartEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::MultiPart(multipart)) = ctx.current() else {
            return chain.next(ctx);
        };
        Box::pin(async move {
            let mut writer = MultipartWriter::new();
            for (name, field) in multipart.fields() {
                match field {
                    Field::Text(value) => writer.text(name, &stringify(value)),
                    Field::File(file) => {
                        let content = file.read().await?;
                        writer.file(name, file.file_name(), &content);
                    }
                }
            }
            let (content_type, body) = writer.finish();
            ctx.set_body(body, &content_type)
        })
    }
}
