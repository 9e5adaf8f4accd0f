//! `multipart/form-data` body writer.
//!
//! Parts are written into a single buffer as they are added; [`MultipartWriter::finish`]
//! appends the closing boundary.

use bytes::{BufMut, Bytes, BytesMut};

use crate::mime;

/// Incremental multipart body writer.
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buf: BytesMut,
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartWriter {
    /// Creates a writer with a fresh boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Creates a writer with a fixed boundary.
    ///
    /// The boundary must not appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: BytesMut::new(),
        }
    }

    /// The boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value for this body.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Writes a plain field.
    pub fn text(&mut self, name: &str, value: &str) {
        self.part_header(name, None, None);
        self.buf.put_slice(value.as_bytes());
        self.buf.put_slice(b"\r\n");
    }

    /// Writes a file part; the content type is guessed from `file_name`.
    pub fn file(&mut self, name: &str, file_name: &str, data: &[u8]) {
        self.part_header(name, Some(file_name), Some(mime::from_file_name(file_name)));
        self.buf.put_slice(data);
        self.buf.put_slice(b"\r\n");
    }

    fn part_header(&mut self, name: &str, file_name: Option<&str>, content_type: Option<&str>) {
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"\r\n");

        self.buf.put_slice(b"Content-Disposition: form-data; name=\"");
        self.buf.put_slice(escape_quotes(name).as_bytes());
        self.buf.put_slice(b"\"");
        if let Some(file_name) = file_name {
            self.buf.put_slice(b"; filename=\"");
            self.buf.put_slice(escape_quotes(file_name).as_bytes());
            self.buf.put_slice(b"\"");
        }
        self.buf.put_slice(b"\r\n");

        if let Some(content_type) = content_type {
            self.buf.put_slice(b"Content-Type: ");
            self.buf.put_slice(content_type.as_bytes());
            self.buf.put_slice(b"\r\n");
        }

        self.buf.put_slice(b"\r\n");
    }

    /// Closes the body; returns (content-type header value, body bytes).
    #[must_use]
    pub fn finish(mut self) -> (String, Bytes) {
        let content_type = self.content_type();
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"--\r\n");
        (content_type, self.buf.freeze())
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}

fn generate_boundary() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("----SugarBoundary{timestamp:x}{sequence:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_unique() {
        let a = MultipartWriter::new();
        let b = MultipartWriter::new();
        assert!(a.boundary().starts_with("----SugarBoundary"));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn text_part() {
        let mut writer = MultipartWriter::with_boundary("b123");
        writer.text("field", "value");
        let (content_type, body) = writer.finish();

        assert_eq!(content_type, "multipart/form-data; boundary=b123");
        assert_eq!(
            String::from_utf8_lossy(&body),
            "--b123\r\nContent-Disposition: form-data; name=\"field\"\r\n\r\nvalue\r\n--b123--\r\n"
        );
    }

    #[test]
    fn file_part() {
        let mut writer = MultipartWriter::with_boundary("b456");
        writer.file("upload", "notes.txt", b"file content");
        let (_, body) = writer.finish();
        let body = String::from_utf8_lossy(&body);

        assert!(body.contains("name=\"upload\"; filename=\"notes.txt\"\r\n"));
        assert!(body.contains("Content-Type: text/plain\r\n"));
        assert!(body.contains("\r\n\r\nfile content\r\n"));
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let mut writer = MultipartWriter::with_boundary("b");
        writer.text("a\"b", "v");
        let (_, body) = writer.finish();
        assert!(String::from_utf8_lossy(&body).contains("name=\"a%22b\""));
    }
}
