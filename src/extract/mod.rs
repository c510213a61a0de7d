use tracing::info;

use crate::data::{self, DocumentKind};

mod encoding;
mod tabular;

pub use encoding::{decode, detect_encoding};
pub use tabular::extract_from_tabular;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_TABULAR_ROW_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    pub max_bytes: usize,
    pub tabular_row_limit: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            tabular_row_limit: DEFAULT_TABULAR_ROW_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl UploadedDocument {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub encoding: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Unsupported file type '{filename}'. Allowed types: .txt, .csv, .tsv, .md, .log")]
    UnsupportedFileType { filename: String },
    #[error("Unsupported content type '{mime}' for file '{filename}'")]
    UnsupportedContentType { filename: String, mime: String },
    #[error("No readable text found in '{filename}'")]
    NoReadableContent { filename: String },
}

pub fn check_size(size: usize, limits: &ExtractLimits) -> Result<(), ExtractError> {
    if size > limits.max_bytes {
        return Err(ExtractError::PayloadTooLarge {
            size,
            limit: limits.max_bytes,
        });
    }
    Ok(())
}

/// Checks everything knowable before the body is read. The extension is
/// authoritative; a declared content type can only reject.
pub fn validate_declared(
    filename: &str,
    content_type: Option<&str>,
    declared_size: Option<usize>,
    limits: &ExtractLimits,
) -> Result<DocumentKind, ExtractError> {
    if let Some(size) = declared_size {
        check_size(size, limits)?;
    }
    if !data::is_allowed_extension(filename) {
        return Err(ExtractError::UnsupportedFileType {
            filename: filename.to_string(),
        });
    }
    if let Some(mime) = content_type
        && !data::is_allowed_upload_mime(mime)
    {
        return Err(ExtractError::UnsupportedContentType {
            filename: filename.to_string(),
            mime: mime.to_string(),
        });
    }
    Ok(data::document_kind(filename))
}

pub fn extract_text(
    document: &UploadedDocument,
    limits: &ExtractLimits,
) -> Result<ExtractedText, ExtractError> {
    let kind = validate_declared(
        &document.filename,
        document.content_type.as_deref(),
        Some(document.size()),
        limits,
    )?;
    let encoding = detect_encoding(&document.bytes);
    let decoded = decode(&document.bytes, encoding);
    let text = if kind.is_tabular() {
        extract_from_tabular(&decoded, kind, limits.tabular_row_limit)
    } else {
        decoded.trim().to_string()
    };
    if text.trim().is_empty() {
        return Err(ExtractError::NoReadableContent {
            filename: document.filename.clone(),
        });
    }
    info!(
        "extracted {} chars from {} (encoding={}, kind={:?})",
        text.chars().count(),
        document.filename,
        encoding.name(),
        kind
    );
    Ok(ExtractedText {
        text,
        encoding: encoding.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(filename: &str, bytes: &[u8], content_type: Option<&str>) -> UploadedDocument {
        UploadedDocument {
            bytes: bytes.to_vec(),
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn plain_text_is_trimmed() {
        let output = extract_text(
            &document("notes.txt", b"\n  hello world \n", Some("text/plain")),
            &ExtractLimits::default(),
        )
        .unwrap();
        assert_eq!(output.text, "hello world");
        assert_eq!(output.encoding, "UTF-8");
    }

    #[test]
    fn csv_goes_through_tabular_extraction() {
        let output = extract_text(
            &document("data.csv", b"42,apple,7.5,banana\n", Some("application/csv")),
            &ExtractLimits::default(),
        )
        .unwrap();
        assert_eq!(output.text, "apple 7.5 banana");
    }

    #[test]
    fn disallowed_extension_wins_over_mime() {
        let err = extract_text(
            &document("payload.exe", b"plain words", Some("text/plain")),
            &ExtractLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType { .. }));
    }

    #[test]
    fn disallowed_mime_is_rejected() {
        let err = extract_text(
            &document("notes.txt", b"plain words", Some("application/pdf")),
            &ExtractLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType { .. }));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let limits = ExtractLimits {
            max_bytes: 8,
            ..ExtractLimits::default()
        };
        let err = extract_text(&document("a.txt", b"more than eight", None), &limits).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::PayloadTooLarge { size: 15, limit: 8 }
        ));
    }

    #[test]
    fn numeric_only_csv_has_no_readable_content() {
        let err = extract_text(
            &document("numbers.csv", b"1,2,3\n4,5,6\n", None),
            &ExtractLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::NoReadableContent { .. }));
    }

    #[test]
    fn whitespace_file_has_no_readable_content() {
        let err = extract_text(
            &document("blank.md", b" \n\t ", None),
            &ExtractLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::NoReadableContent { .. }));
    }
}
