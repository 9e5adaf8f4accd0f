//! Request parameter types.
//!
//! A request is described by a list of heterogeneous [`Param`]s. Each
//! variant is claimed by exactly one encoder in the encoder chain:
//!
//! ```
//! use sugar_core::{BasicAuth, Header, Json, Param, Path, Query, params};
//!
//! let params: Vec<Param> = params![
//!     Path::new().add("id", 42),
//!     Query::new().add("tag", ["a", "b"]),
//!     Header::new().add("X-Trace", "on"),
//!     BasicAuth::new("user", "secret"),
//!     Json::raw(r#"{"name":"bookA"}"#),
//! ];
//! assert_eq!(params.len(), 5);
//! ```

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Pairs, Result, Value};

macro_rules! pair_param {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(Pairs);

        impl $name {
            /// Creates an empty parameter.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Appends a key/value pair.
            #[must_use]
            pub fn add(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
                Self(self.0.add(key, value))
            }

            /// The underlying pairs.
            #[must_use]
            pub fn pairs(&self) -> &Pairs {
                &self.0
            }
        }

        impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for $name {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }

        impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for $name {
            fn from(pairs: [(K, V); N]) -> Self {
                Self(Pairs::from(pairs))
            }
        }

        impl From<Pairs> for $name {
            fn from(pairs: Pairs) -> Self {
                Self(pairs)
            }
        }

        impl From<$name> for Param {
            fn from(param: $name) -> Self {
                Self::$name(param)
            }
        }
    };
}

pair_param!(
    /// Values substituted into `:name` placeholders of the URL path.
    Path
);
pair_param!(
    /// Query string entries; list values become repeated keys.
    Query
);
pair_param!(
    /// Header values, appended to any existing values.
    Header
);
pair_param!(
    /// Cookies, one per pair.
    Cookie
);
pair_param!(
    /// URL-encoded form body; list values become repeated fields.
    Form
);

type Serializer = Arc<dyn Fn() -> Result<Bytes> + Send + Sync>;

#[derive(Clone)]
enum Payload {
    Raw(Bytes),
    Deferred(Serializer),
}

impl Payload {
    fn encode(&self) -> Result<Bytes> {
        match self {
            Self::Raw(bytes) => Ok(bytes.clone()),
            Self::Deferred(serialize) => serialize(),
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(bytes) => f.debug_tuple("Raw").field(bytes).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// JSON body.
///
/// Values passed to [`Json::new`] are serialized when the encoder runs, so a
/// serialization failure aborts the request from the encoder chain.
#[derive(Debug, Clone)]
pub struct Json(Payload);

impl Json {
    /// A value serialized with `serde_json`.
    pub fn new<T>(value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self(Payload::Deferred(Arc::new(move || crate::to_json(&value))))
    }

    /// Pre-encoded JSON, sent verbatim.
    pub fn raw(json: impl Into<Bytes>) -> Self {
        Self(Payload::Raw(json.into()))
    }

    /// Body bytes.
    pub fn encode(&self) -> Result<Bytes> {
        self.0.encode()
    }
}

/// XML body.
#[derive(Debug, Clone)]
pub struct Xml(Payload);

impl Xml {
    /// A value serialized with `quick-xml`.
    pub fn new<T>(value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self(Payload::Deferred(Arc::new(move || crate::to_xml(&value))))
    }

    /// A pre-built document, sent verbatim.
    pub fn raw(xml: impl Into<String>) -> Self {
        Self(Payload::Raw(Bytes::from(xml.into())))
    }

    /// Body bytes.
    pub fn encode(&self) -> Result<Bytes> {
        self.0.encode()
    }
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BasicAuth {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Bytes),
}

/// A named file-like handle streamed as a multipart file part.
#[derive(Debug, Clone)]
pub struct FileHandle {
    file_name: String,
    source: FileSource,
}

impl FileHandle {
    /// A file on disk, read when the request is encoded.
    ///
    /// The part's file name is the last component of `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            source: FileSource::Path(path),
        }
    }

    /// In-memory content under the given file name.
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Bytes(content.into()),
        }
    }

    /// File name sent in the part's `Content-Disposition`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Reads the whole content.
    pub async fn read(&self) -> std::io::Result<Bytes> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A multipart field.
#[derive(Debug, Clone)]
pub enum Field {
    /// Plain value, stringified.
    Text(Value),
    /// File part.
    File(FileHandle),
}

impl<T: Into<Value>> From<T> for Field {
    fn from(value: T) -> Self {
        Self::Text(value.into())
    }
}

impl From<FileHandle> for Field {
    fn from(file: FileHandle) -> Self {
        Self::File(file)
    }
}

/// `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultiPart(Vec<(String, Field)>);

impl MultiPart {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.0.push((name.into(), field.into()));
        self
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.0.iter().map(|(name, field)| (name.as_str(), field))
    }
}

/// A user-defined parameter, claimed by a user-registered encoder.
///
/// # Example
///
/// ```
/// use sugar_core::{Custom, Param};
///
/// struct ApiKey(&'static str);
///
/// let param = Param::custom(ApiKey("k-123"));
/// let Param::Custom(custom) = &param else { unreachable!() };
/// assert_eq!(custom.downcast_ref::<ApiKey>().map(|k| k.0), Some("k-123"));
/// ```
#[derive(Clone)]
pub struct Custom {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Custom {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// The wrapped value, if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for Custom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Custom").field(&self.type_name).finish()
    }
}

/// A request parameter.
#[derive(Debug, Clone)]
pub enum Param {
    /// Path variables.
    Path(Path),
    /// Query entries.
    Query(Query),
    /// Headers.
    Header(Header),
    /// Cookies.
    Cookie(Cookie),
    /// URL-encoded form body.
    Form(Form),
    /// JSON body.
    Json(Json),
    /// XML body.
    Xml(Xml),
    /// Multipart body.
    MultiPart(MultiPart),
    /// Basic authentication.
    BasicAuth(BasicAuth),
    /// Plain text body.
    Text(String),
    /// User-defined parameter.
    Custom(Custom),
}

impl Param {
    /// Wraps a user-defined value.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Custom::new(value))
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Query(_) => "query",
            Self::Header(_) => "header",
            Self::Cookie(_) => "cookie",
            Self::Form(_) => "form",
            Self::Json(_) => "json",
            Self::Xml(_) => "xml",
            Self::MultiPart(_) => "multipart",
            Self::BasicAuth(_) => "basic-auth",
            Self::Text(_) => "text",
            Self::Custom(custom) => custom.type_name,
        }
    }

    /// Returns `true` for variants that set the request body.
    #[must_use]
    pub const fn is_body(&self) -> bool {
        matches!(
            self,
            Self::Form(_) | Self::Json(_) | Self::Xml(_) | Self::MultiPart(_) | Self::Text(_)
        )
    }
}

impl From<Json> for Param {
    fn from(param: Json) -> Self {
        Self::Json(param)
    }
}

impl From<Xml> for Param {
    fn from(param: Xml) -> Self {
        Self::Xml(param)
    }
}

impl From<MultiPart> for Param {
    fn from(param: MultiPart) -> Self {
        Self::MultiPart(param)
    }
}

impl From<BasicAuth> for Param {
    fn from(param: BasicAuth) -> Self {
        Self::BasicAuth(param)
    }
}

impl From<Custom> for Param {
    fn from(param: Custom) -> Self {
        Self::Custom(param)
    }
}

impl From<String> for Param {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Param {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Builds a `Vec<Param>` from heterogeneous parameter values.
///
/// ```
/// use sugar_core::{Query, params};
///
/// let none = params![];
/// assert!(none.is_empty());
///
/// let some = params![Query::new().add("page", 1), "plain body"];
/// assert_eq!(some.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($param:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::from($param)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_params_from_arrays() {
        let query = Query::from([("name", "bookA")]);
        assert_eq!(query.pairs().get("name"), Some(&Value::from("bookA")));

        let path: Path = [("id", 1), ("page", 2)].into_iter().collect();
        assert_eq!(path.pairs().len(), 2);
    }

    #[test]
    fn param_kinds() {
        assert_eq!(Param::from(Header::new()).kind(), "header");
        assert_eq!(Param::from("text").kind(), "text");
        assert!(Param::from(Form::new()).is_body());
        assert!(!Param::from(Cookie::new()).is_body());
        assert!(Param::custom(7_u8).kind().contains("u8"));
    }

    #[test]
    fn json_payload_is_serialized_lazily() {
        let json = Json::new(serde_json::json!({"name": "bookA"}));
        assert_eq!(json.encode().expect("encode").as_ref(), br#"{"name":"bookA"}"#);

        let raw = Json::raw(r#"{"name":"bookB"}"#);
        assert_eq!(raw.encode().expect("encode").as_ref(), br#"{"name":"bookB"}"#);
    }

    #[test]
    fn basic_auth_debug_hides_password() {
        let debug = format!("{:?}", BasicAuth::new("user", "secret"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn file_handle_name_from_path() {
        let handle = FileHandle::open("/tmp/uploads/cover.png");
        assert_eq!(handle.file_name(), "cover.png");
    }

    #[tokio::test]
    async fn file_handle_missing_file_errors() {
        let handle = FileHandle::open("/definitely/not/here.bin");
        assert!(handle.read().await.is_err());
    }
}
