use std::path::Path;

pub const TEXT_MIME: &str = "text/plain";
pub const CSV_MIME: &str = "text/csv";
pub const TSV_MIME: &str = "text/tab-separated-values";
pub const MARKDOWN_MIME: &str = "text/markdown";
pub const HTML_MIME: &str = "text/html";
pub const CSS_MIME: &str = "text/css";
pub const JS_MIME: &str = "text/javascript";
pub const JSON_MIME: &str = "application/json";
pub const SVG_MIME: &str = "image/svg+xml";
pub const PNG_MIME: &str = "image/png";
pub const ICO_MIME: &str = "image/x-icon";
pub const APPLICATION_CSV_MIME: &str = "application/csv";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Extensions accepted by the upload endpoint.
pub const UPLOAD_EXTENSIONS: &[&str] = &["txt", "csv", "tsv", "md", "log"];

/// Declared content types accepted verbatim in addition to any `text/*` type.
pub const UPLOAD_MIMES: &[&str] = &[
    TEXT_MIME,
    CSV_MIME,
    TSV_MIME,
    MARKDOWN_MIME,
    APPLICATION_CSV_MIME,
    OCTET_STREAM_MIME,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Plain,
    Csv,
    Tsv,
}

impl DocumentKind {
    pub fn is_tabular(&self) -> bool {
        !matches!(self, DocumentKind::Plain)
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            DocumentKind::Tsv => b'\t',
            _ => b',',
        }
    }
}

pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn is_allowed_extension(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn document_kind(filename: &str) -> DocumentKind {
    match file_extension(filename).as_deref() {
        Some("tsv") => DocumentKind::Tsv,
        Some("csv") => DocumentKind::Csv,
        _ => DocumentKind::Plain,
    }
}

/// Strips parameters such as `; charset=utf-8` and lowercases the essence.
pub fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or(mime)
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_upload_mime(mime: &str) -> bool {
    let essence = mime_essence(mime);
    if essence.is_empty() {
        return true;
    }
    if essence.starts_with("text/") {
        return true;
    }
    UPLOAD_MIMES.contains(&essence.as_str())
}

pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => HTML_MIME,
        Some("css") => CSS_MIME,
        Some("js") | Some("mjs") => JS_MIME,
        Some("json") => JSON_MIME,
        Some("svg") => SVG_MIME,
        Some("png") => PNG_MIME,
        Some("ico") => ICO_MIME,
        Some("txt") => TEXT_MIME,
        _ => OCTET_STREAM_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_extension("notes.TXT"));
        assert!(is_allowed_extension("table.csv"));
        assert!(is_allowed_extension("server.log"));
        assert!(!is_allowed_extension("setup.exe"));
        assert!(!is_allowed_extension("README"));
        assert!(!is_allowed_extension("archive.csv.zip"));
    }

    #[test]
    fn tabular_kind_follows_extension() {
        assert_eq!(document_kind("a.tsv"), DocumentKind::Tsv);
        assert_eq!(document_kind("a.CSV"), DocumentKind::Csv);
        assert_eq!(document_kind("a.md"), DocumentKind::Plain);
        assert_eq!(DocumentKind::Tsv.delimiter(), b'\t');
        assert_eq!(DocumentKind::Csv.delimiter(), b',');
    }

    #[test]
    fn mime_check_accepts_text_family_and_allow_set() {
        assert!(is_allowed_upload_mime("text/plain; charset=utf-8"));
        assert!(is_allowed_upload_mime("text/x-log"));
        assert!(is_allowed_upload_mime("application/csv"));
        assert!(is_allowed_upload_mime("application/octet-stream"));
        assert!(!is_allowed_upload_mime("application/pdf"));
        assert!(!is_allowed_upload_mime("image/png"));
    }
}
