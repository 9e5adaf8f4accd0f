//! Encoders that only touch request headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::BoxFuture;
use http::header::{AUTHORIZATION, COOKIE};

use super::{EncodeContext, Encoder, EncoderChain, done};
use crate::{Error, Param, Result, Value, stringify};

/// Appends header values; list values add one header line per element.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder for HeaderEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Header(header)) = ctx.current() else {
            return chain.next(ctx);
        };
        let result = header
            .pairs()
            .expanded()
            .try_for_each(|(name, value)| ctx.request_mut().append_header(name, &value));
        done(result)
    }
}

/// Adds the pairs to the request's `Cookie` header.
///
/// Names must be HTTP tokens. Values keep printable ASCII only, minus `"`,
/// `;` and `\`; a value holding a space or a comma is sent quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieEncoder;

impl Encoder for CookieEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::Cookie(cookie)) = ctx.param() else {
            return chain.next(ctx);
        };
        let mut cookies: Vec<String> = ctx
            .request()
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let pairs: Result<Vec<String>> = cookie
            .pairs()
            .iter()
            .map(|(name, value)| cookie_pair(name, value))
            .collect();
        match pairs {
            Ok(pairs) => cookies.extend(pairs),
            Err(err) => return done(Err(err)),
        }
        if cookies.is_empty() {
            return done(Ok(()));
        }
        done(ctx.request_mut().set_header(COOKIE.as_str(), &cookies.join("; ")))
    }
}

fn cookie_pair(name: &str, value: &Value) -> Result<String> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(Error::invalid_request(format!("invalid cookie name {name:?}")));
    }
    let value: String = stringify(value)
        .chars()
        .filter(|c| matches!(c, ' '..='~') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if value.contains([' ', ',']) {
        Ok(format!("{name}=\"{value}\""))
    } else {
        Ok(format!("{name}={value}"))
    }
}

const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Sets `Authorization: Basic <base64(user:password)>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthEncoder;

impl Encoder for BasicAuthEncoder {
    fn encode<'a>(
        &'a self,
        ctx: &'a mut EncodeContext,
        chain: EncoderChain<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let Some(Param::BasicAuth(auth)) = ctx.param() else {
            return chain.next(ctx);
        };
        let credentials = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
        done(
            ctx.request_mut()
                .set_header(AUTHORIZATION.as_str(), &format!("Basic {credentials}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use crate::encoder::tests::encode;
    use crate::{BasicAuth, Cookie, Error, Header, params};

    #[tokio::test]
    async fn headers_are_additive() {
        let request = encode(
            "http://example.com",
            params![
                Header::new().add("X-Tag", "a"),
                Header::new().add("X-Tag", ["b", "c"]).add("X-Count", 3),
            ],
        )
        .await
        .expect("encode");

        let tags: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        check!(tags == ["a", "b", "c"]);
        check!(request.header("x-count") == Some("3"));
    }

    #[tokio::test]
    async fn invalid_header_is_reported() {
        let result = encode(
            "http://example.com",
            params![Header::new().add("X-Bad", "line\nbreak")],
        )
        .await;
        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("X-Bad") || message.contains("x-bad"));
    }

    #[tokio::test]
    async fn cookies_join_into_one_header() {
        let request = encode(
            "http://example.com",
            params![
                Cookie::new().add("session", "abc").add("theme", "dark"),
                Cookie::new().add("lang", "en"),
            ],
        )
        .await
        .expect("encode");

        check!(request.headers().get_all("cookie").iter().count() == 1);
        check!(request.header("cookie") == Some("session=abc; theme=dark; lang=en"));
    }

    #[tokio::test]
    async fn cookie_values_cannot_add_cookies() {
        let request = encode(
            "http://example.com",
            params![Cookie::new().add("session", "abc; admin=true").add("note", "a\"b\\c\r\n")],
        )
        .await
        .expect("encode");

        check!(request.header("cookie") == Some(r#"session="abc admin=true"; note=abc"#));
    }

    #[tokio::test]
    async fn cookie_value_with_comma_is_quoted() {
        let request = encode("http://example.com", params![Cookie::new().add("tags", "a,b")])
            .await
            .expect("encode");
        check!(request.header("cookie") == Some(r#"tags="a,b""#));
    }

    #[tokio::test]
    async fn invalid_cookie_name_is_rejected() {
        for name in ["", "admin=true", "a;b", "two words", "tab\t"] {
            let result = encode("http://example.com", params![Cookie::new().add(name, "x")]).await;
            let_assert!(Err(Error::InvalidRequest(message)) = result);
            check!(message.contains("cookie name"));
        }
    }

    #[tokio::test]
    async fn basic_auth_header() {
        let request = encode(
            "http://example.com",
            params![BasicAuth::new("Aladdin", "open sesame")],
        )
        .await
        .expect("encode");
        check!(request.header("authorization") == Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="));
        check!(request.body() == None);
    }
}
