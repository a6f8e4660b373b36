//! Decoding of raw file bytes fetched from the remote repository.
//!
//! Content arrives base64-encoded with no charset information, so the
//! encoding is sniffed the same way for every file:
//! - BOM markers (UTF-8, UTF-16 LE/BE)
//! - strict UTF-8 fast path
//! - chardetng guess for everything else, decoded with replacement

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const SAMPLE_SIZE: usize = 8192;

/// Encoding that `bytes` appear to use.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        return UTF_8;
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return UTF_16LE;
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        return UTF_16BE;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    detector.guess(None, true)
}

/// Decode `bytes` to a `String`, never failing.
///
/// BOMs are stripped; invalid sequences become U+FFFD.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.strip_prefix('\u{feff}').unwrap_or(text).to_string();
    }

    let encoding = detect_encoding(bytes);
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Lossy decode using {}", used.name());
    }
    decoded.into_owned()
}

/// Null bytes or a low ratio of printable ASCII mark content as binary.
pub fn is_binary_bytes(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if bytes.starts_with(&[0xff, 0xfe]) || bytes.starts_with(&[0xfe, 0xff]) {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    if std::str::from_utf8(sample).is_ok() {
        return false;
    }

    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r')
        .count();
    (printable as f64 / sample.len() as f64) < 0.70
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_bytes("const rocket = '🚀';".as_bytes()), "const rocket = '🚀';");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"hello");
        assert_eq!(decode_bytes(&bytes), "hello");
    }

    #[test]
    fn test_decode_utf16_le() {
        let bytes = [0xff, 0xfe, b'h', 0x00, b'i', 0x00];
        assert_eq!(decode_bytes(&bytes), "hi");
    }

    #[test]
    fn test_decode_latin1_falls_back() {
        // "café" in windows-1252
        let decoded = decode_bytes(&[b'c', b'a', b'f', 0xe9]);
        assert!(decoded.starts_with("caf"));
        assert_eq!(decoded.chars().count(), 4);
    }

    #[test]
    fn test_binary_detection() {
        assert!(is_binary_bytes(&[0x00, 0x01, 0x02]));
        assert!(!is_binary_bytes(b"fn main() {}\n"));
        assert!(!is_binary_bytes(b""));
    }
}
