//! JSON and XML (de)serialization helpers shared by the encoders and decoders.

use bytes::Bytes;

use crate::{Error, Result};

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use sugar_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Book { name: String }
///
/// let bytes = to_json(&Book { name: "bookA".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"bookA"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Errors name the field that failed (e.g. `[0].name`), courtesy of
/// `serde_path_to_error`.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::json_deserialization(e.path().to_string(), e.inner().to_string()))
}

/// Serialize a value to an XML document; the root element is named after the type.
pub fn to_xml<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    quick_xml::se::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(|e| Error::XmlSerialization(e.to_string()))
}

/// Deserialize an XML document.
pub fn from_xml<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::XmlDeserialization(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| Error::XmlDeserialization(e.to_string()))
}
