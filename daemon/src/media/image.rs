//! Source image loading for image-to-video requests.
//!
//! Images travel inline in the request body as base64, tagged with their
//! MIME type.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{DaemonError, Result};
use crate::types::InlineImage;

/// Largest image accepted for inline upload (20 MiB).
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Detects an image MIME type from magic bytes, falling back to the file extension.
pub fn detect_mime_type(bytes: &[u8], path: Option<&Path>) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    let ext = path?.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Base64-encodes image bytes that were already read into memory.
pub fn encode_image_bytes(bytes: &[u8], path: Option<&Path>) -> Result<InlineImage> {
    if bytes.is_empty() {
        return Err(DaemonError::invalid_image("file is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(DaemonError::invalid_image(format!(
            "{} bytes exceeds the {} byte limit",
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }

    let mime_type = detect_mime_type(bytes, path)
        .ok_or_else(|| DaemonError::invalid_image("unrecognised image format"))?;

    Ok(InlineImage {
        mime_type: mime_type.to_string(),
        data_base64: STANDARD.encode(bytes),
    })
}

/// Reads an image file and encodes it for inline upload.
pub fn encode_image_file(path: &Path) -> Result<InlineImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        DaemonError::invalid_image(format!("cannot read {}: {}", path.display(), e))
    })?;
    encode_image_bytes(&bytes, Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn detects_by_magic_bytes() {
        assert_eq!(detect_mime_type(&PNG_MAGIC, None), Some("image/png"));
        assert_eq!(detect_mime_type(&[0xff, 0xd8, 0xff, 0xe0], None), Some("image/jpeg"));
        assert_eq!(detect_mime_type(b"GIF89a...", None), Some("image/gif"));
        assert_eq!(detect_mime_type(b"RIFF\0\0\0\0WEBPVP8 ", None), Some("image/webp"));
    }

    #[test]
    fn falls_back_to_extension() {
        let path = Path::new("photo.JPG");
        assert_eq!(detect_mime_type(b"????", Some(path)), Some("image/jpeg"));
        assert_eq!(detect_mime_type(b"????", Some(Path::new("notes.txt"))), None);
        assert_eq!(detect_mime_type(b"????", None), None);
    }

    #[test]
    fn encodes_file_as_base64() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let image = encode_image_file(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_base64, STANDARD.encode(PNG_MAGIC));
    }

    #[test]
    fn rejects_empty_and_unknown() {
        assert_eq!(
            encode_image_bytes(&[], None).unwrap_err().code,
            ErrorCode::InvalidImage
        );
        assert_eq!(
            encode_image_bytes(b"plain text", Some(Path::new("a.txt")))
                .unwrap_err()
                .code,
            ErrorCode::InvalidImage
        );
    }

    #[test]
    fn missing_file_is_invalid_image() {
        let err = encode_image_file(Path::new("/definitely/not/here.png")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImage);
    }
}
