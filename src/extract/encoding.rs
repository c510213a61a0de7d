use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// Picks the encoding for an uploaded byte stream: BOM first, then strict
/// UTF-8, then a statistical guess.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Decodes with `encoding`; malformed input falls back to lossy UTF-8.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        debug!(
            "decode as {} hit malformed input; falling back to lossy UTF-8",
            encoding.name()
        );
        return String::from_utf8_lossy(body).into_owned();
    }
    text.into_owned()
}
