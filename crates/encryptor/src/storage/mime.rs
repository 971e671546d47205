//! Content-type detection run over plaintext before it is stored.

/// Returned for zero-length content.
pub const EMPTY_MIME: &str = "application/x-empty";
/// Returned when no signature matches and the bytes are not UTF-8.
pub const BINARY_MIME: &str = "application/octet-stream";
/// Returned for UTF-8 text with no more specific signature.
pub const TEXT_MIME: &str = "text/plain";

/// Maps a plaintext buffer to a content type string.
#[cfg_attr(test, mockall::automock)]
pub trait ContentTypeDetector: Send + Sync {
    fn detect(&self, bytes: &[u8]) -> String;
}

/// Leading-byte signatures and the content types they identify.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B", "application/gzip"),
    (b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1", "application/x-ole-storage"),
];

/// Signature-based detector covering common document, image and archive
/// formats, with UTF-8 text and binary fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicDetector;

impl MagicDetector {
    fn riff(bytes: &[u8]) -> Option<&'static str> {
        if bytes.len() < 12 || &bytes[..4] != b"RIFF" {
            return None;
        }
        match &bytes[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        }
    }

    fn text(bytes: &[u8]) -> Option<&'static str> {
        let text = std::str::from_utf8(bytes).ok()?;
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with("<?xml") {
            return Some("text/xml");
        }
        let lower: String = trimmed.chars().take(16).collect::<String>().to_ascii_lowercase();
        if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
            return Some("text/html");
        }
        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(text).is_ok()
        {
            return Some("application/json");
        }
        Some(TEXT_MIME)
    }
}

impl ContentTypeDetector for MagicDetector {
    fn detect(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return EMPTY_MIME.to_owned();
        }
        SIGNATURES
            .iter()
            .find(|(magic, _)| bytes.starts_with(magic))
            .map(|(_, mime)| *mime)
            .or_else(|| Self::riff(bytes))
            .or_else(|| Self::text(bytes))
            .unwrap_or(BINARY_MIME)
            .to_owned()
    }
}
