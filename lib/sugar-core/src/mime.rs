//! MIME type constants and file-extension lookup.

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// URL-encoded form.
pub const FORM: &str = "application/x-www-form-urlencoded";
/// JSON.
pub const JSON: &str = "application/json";
/// JSON with explicit charset, set on encoded JSON bodies.
pub const JSON_UTF8: &str = "application/json; charset=UTF-8";
/// XML.
pub const XML: &str = "application/xml";
/// XML with explicit charset, set on encoded XML bodies.
pub const XML_UTF8: &str = "application/xml; charset=UTF-8";
/// Plain text.
pub const PLAIN_TEXT: &str = "text/plain";
/// Generic binary.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the MIME type from a file name's extension.
///
/// Unknown or missing extensions yield [`OCTET_STREAM`].
#[must_use]
pub fn from_file_name(file_name: &str) -> &'static str {
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return OCTET_STREAM;
    };

    match extension.to_ascii_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        // Text
        "txt" => PLAIN_TEXT,
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => JSON,
        "xml" => XML,
        "csv" => "text/csv",
        "md" => "text/markdown",
        // Archives
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" | "gzip" => "application/gzip",
        "7z" => "application/x-7z-compressed",
        // Audio/Video
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "wasm" => "application/wasm",
        _ => OCTET_STREAM,
    }
}

/// Case-insensitive substring match of a header value against a MIME token.
#[must_use]
pub fn matches(header_value: &str, token: &str) -> bool {
    header_value
        .to_ascii_lowercase()
        .contains(&token.to_ascii_lowercase())
}
