//! Process-wide default client and free-function shortcuts.
//!
//! ```no_run
//! use sugar::{Header, Query, params};
//!
//! # async fn run() -> sugar::Result<()> {
//! sugar::apply(params![Header::new().add("Authorization", "Bearer token")]);
//! let (body, _) = sugar::get("https://api.example.com/books", params![Query::new().add("page", 1)])
//!     .await
//!     .read_text()?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, LazyLock};

use crate::{Client, Decoder, Encoder, Method, Param, Plugin, Reply};

static DEFAULT: LazyLock<Client> = LazyLock::new(Client::new);

/// The lazily-created client behind the free functions.
#[must_use]
pub fn default_client() -> &'static Client {
    &DEFAULT
}

/// `GET` with the default client.
pub async fn get(url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.get(url, params).await
}

/// `POST` with the default client.
pub async fn post(url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.post(url, params).await
}

/// `PUT` with the default client.
pub async fn put(url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.put(url, params).await
}

/// `PATCH` with the default client.
pub async fn patch(url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.patch(url, params).await
}

/// `DELETE` with the default client.
pub async fn delete(url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.delete(url, params).await
}

/// Any method with the default client.
pub async fn send(method: Method, url: &str, params: impl IntoIterator<Item = Param>) -> Reply {
    DEFAULT.send(method, url, params).await
}

/// Adds presets to the default client.
pub fn apply(params: impl IntoIterator<Item = Param>) {
    DEFAULT.apply(params);
}

/// Clears the default client's presets.
pub fn reset() {
    DEFAULT.reset();
}

/// Appends a plugin to the default client.
pub fn use_plugin(plugin: impl Plugin + 'static) {
    DEFAULT.use_plugin(plugin);
}

/// The default client's encoders, in lookup order.
#[must_use]
pub fn default_encoders() -> &'static [Arc<dyn Encoder>] {
    DEFAULT.encoders()
}

/// The default client's decoders, in lookup order.
#[must_use]
pub fn default_decoders() -> &'static [Arc<dyn Decoder>] {
    DEFAULT.decoders()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_uses_builtin_handlers() {
        assert_eq!(default_encoders().len(), crate::builtin_encoders().len());
        assert_eq!(default_decoders().len(), crate::builtin_decoders().len());
        assert!(std::ptr::eq(default_client(), default_client()));
    }
}
