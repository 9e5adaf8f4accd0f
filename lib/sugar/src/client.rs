//! The client façade: presets, encoders, plugins, transport and decoders.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;
use url::Url;

use crate::{
    Context, Decoder, EncodeContext, Encoder, Error, HyperTransport, Method, Param, Plugin, Reply,
    Request, Response, Result, Transporter, builtin_decoders, builtin_encoders,
};

/// A fluent HTTP client.
///
/// Each request runs its parameters (presets first) through the encoder
/// chain, sends the encoded request through the plugin pipeline, and returns
/// a [`Reply`] to decode.
///
/// Encoders and decoders are fixed once the client is built. Presets and
/// plugins may change on a live client; each request works on a snapshot
/// taken when it starts.
///
/// # Example
///
/// ```no_run
/// use serde::Deserialize;
/// use sugar::{Client, Query, params};
///
/// #[derive(Debug, Deserialize)]
/// struct Book {
///     name: String,
/// }
///
/// # async fn run() -> sugar::Result<()> {
/// let client = Client::new();
/// let (books, _) = client
///     .get("https://api.example.com/books", params![Query::new().add("name", "bookA")])
///     .await
///     .read_value::<Vec<Book>>()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    transport: Arc<dyn Transporter>,
    encoders: Arc<[Arc<dyn Encoder>]>,
    decoders: Arc<[Arc<dyn Decoder>]>,
    plugins: RwLock<Arc<[Arc<dyn Plugin>]>>,
    presets: RwLock<Vec<Param>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .field("plugins", &self.plugins_snapshot().len())
            .field("presets", &self.presets_snapshot())
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// A client with the built-in encoders and decoders, no plugins, and a
    /// default [`HyperTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// `GET` request.
    pub async fn get(&self, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
        self.send(Method::GET, url, params).await
    }

    /// `POST` request.
    pub async fn post(&self, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
        self.send(Method::POST, url, params).await
    }

    /// `PUT` request.
    pub async fn put(&self, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
        self.send(Method::PUT, url, params).await
    }

    /// `PATCH` request.
    pub async fn patch(&self, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
        self.send(Method::PATCH, url, params).await
    }

    /// `DELETE` request.
    pub async fn delete(&self, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
        self.send(Method::DELETE, url, params).await
    }

    /// Request with any method.
    ///
    /// Encoding errors are returned in the reply and nothing is sent.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        params: impl IntoIterator<Item = Param>,
    ) -> Reply {
        let mut all = self.presets_snapshot();
        all.extend(params);
        let decoders = Arc::clone(&self.decoders);

        let request = match self.encode(method, url, all).await {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, url, "request encoding failed");
                return Reply::new(None, Err(err), decoders);
            }
        };

        let (request, result) = self.dispatch(request).await;
        Reply::new(Some(request), result, decoders)
    }

    async fn encode(&self, method: Method, url: &str, params: Vec<Param>) -> Result<Request> {
        let url = Url::parse(url)?;
        debug!(%method, %url, params = params.len(), "encoding request");

        let mut ctx = EncodeContext::new(Request::new(method, url), params.into());
        ctx.encode_all(&self.encoders).await?;
        Ok(ctx.into_request())
    }

    async fn dispatch(&self, request: Request) -> (Request, Result<Response>) {
        let mut ctx = Context::new(request, Arc::clone(&self.transport), self.plugins_snapshot());
        let result = ctx.next().await;
        let (request, response) = ctx.into_parts();

        let result = match (result, response) {
            (Ok(()), Some(response)) => Ok(response),
            (Ok(()), None) => Err(Error::invalid_request(
                "plugin pipeline finished without a response",
            )),
            (Err(err), _) => Err(err),
        };
        (request, result)
    }

    /// Adds parameters applied before the call's own on every later request.
    pub fn apply(&self, params: impl IntoIterator<Item = Param>) {
        self.presets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(params);
    }

    /// Removes every preset.
    pub fn reset(&self) {
        self.presets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Appends a plugin to the pipeline of later requests.
    pub fn use_plugin(&self, plugin: impl Plugin + 'static) {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        let mut extended = plugins.to_vec();
        extended.push(Arc::new(plugin));
        *plugins = extended.into();
    }

    /// Encoders in lookup order.
    #[must_use]
    pub fn encoders(&self) -> &[Arc<dyn Encoder>] {
        &self.encoders
    }

    /// Decoders in lookup order.
    #[must_use]
    pub fn decoders(&self) -> &[Arc<dyn Decoder>] {
        &self.decoders
    }

    /// Current presets.
    #[must_use]
    pub fn presets(&self) -> Vec<Param> {
        self.presets_snapshot()
    }

    fn presets_snapshot(&self) -> Vec<Param> {
        self.presets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn plugins_snapshot(&self) -> Arc<[Arc<dyn Plugin>]> {
        Arc::clone(&self.plugins.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Builder for [`Client`].
///
/// Starts from the built-in encoders and decoders. A registered encoder or
/// decoder is placed in front of everything registered before it, so the
/// last one registered is consulted first.
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transporter>>,
    encoders: Vec<Arc<dyn Encoder>>,
    decoders: Vec<Arc<dyn Decoder>>,
    plugins: Vec<Arc<dyn Plugin>>,
    presets: Vec<Param>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            encoders: builtin_encoders(),
            decoders: builtin_decoders(),
            plugins: Vec::new(),
            presets: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("custom_transport", &self.transport.is_some())
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .field("plugins", &self.plugins.len())
            .field("presets", &self.presets)
            .finish()
    }
}

impl ClientBuilder {
    /// Use a custom transport instead of [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: impl Transporter + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Register an encoder ahead of those already registered.
    #[must_use]
    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoders.insert(0, Arc::new(encoder));
        self
    }

    /// Register a decoder ahead of those already registered.
    #[must_use]
    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoders.insert(0, Arc::new(decoder));
        self
    }

    /// Append a plugin; plugins run in the order they were added.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Add a preset parameter.
    #[must_use]
    pub fn preset(mut self, param: impl Into<Param>) -> Self {
        self.presets.push(param.into());
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> Client {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));
        Client {
            transport,
            encoders: self.encoders.into(),
            decoders: self.decoders.into(),
            plugins: RwLock::new(self.plugins.into()),
            presets: RwLock::new(self.presets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Header, Logger, Query, params};

    #[tokio::test]
    async fn presets_apply_and_reset() {
        let client = Client::builder()
            .preset(Header::new().add("X-Api", "v1"))
            .build();
        client.apply(params![Query::new().add("lang", "en")]);
        assert_eq!(client.presets().len(), 2);

        client.reset();
        assert!(client.presets().is_empty());
    }

    #[tokio::test]
    async fn registered_handlers_go_first() {
        let client = Client::builder()
            .encoder(crate::QueryEncoder)
            .decoder(crate::PlainTextDecoder)
            .build();
        assert_eq!(client.encoders().len(), builtin_encoders().len() + 1);
        assert_eq!(client.decoders().len(), builtin_decoders().len() + 1);
    }

    #[tokio::test]
    async fn use_plugin_extends_pipeline() {
        let client = Client::new();
        client.use_plugin(Logger::new());
        client.use_plugin(Logger::debug());
        assert_eq!(client.plugins_snapshot().len(), 2);
        assert!(format!("{client:?}").contains("plugins: 2"));
    }

    #[tokio::test]
    async fn invalid_url_is_reported_without_sending() {
        let reply = Client::new().get("not a url", params![]).await;
        assert!(matches!(reply.error(), Some(Error::InvalidUrl(_))));
        assert!(reply.request().is_none());
    }
}
