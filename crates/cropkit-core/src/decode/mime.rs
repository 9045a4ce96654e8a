//! MIME type lookup by file extension.

use crate::identifier::ImageIdentifier;

/// MIME type of every saved crop.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", JPEG_MIME_TYPE),
    ("jpeg", JPEG_MIME_TYPE),
    ("jpe", JPEG_MIME_TYPE),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("wbmp", "image/vnd.wap.wbmp"),
    ("ico", "image/x-icon"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("avif", "image/avif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("dng", "image/x-adobe-dng"),
    ("cr2", "image/x-canon-cr2"),
    ("nef", "image/x-nikon-nef"),
    ("arw", "image/x-sony-arw"),
];

/// MIME type for a bare extension, matched case-insensitively.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Extension of the last path segment, without the dot.
///
/// `None` when the last segment has no dot or ends with one.
pub fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = name.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

/// MIME type of `id`, judged by the extension of its path.
pub fn resolve_mime_type(id: &ImageIdentifier) -> Option<&'static str> {
    extension_of(id.path()).and_then(mime_type_for_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("/sdcard/DCIM/a.jpg"), Some("jpg"));
        assert_eq!(extension_of("/sdcard/DCIM/a.b.PNG"), Some("PNG"));
        assert_eq!(extension_of("/sdcard/DCIM/noext"), None);
        assert_eq!(extension_of("/sdcard/v1.2/noext"), None);
        assert_eq!(extension_of("/sdcard/trailing."), None);
        assert_eq!(extension_of("photo.webp"), Some("webp"));
    }

    #[test]
    fn test_mime_type_for_extension() {
        assert_eq!(mime_type_for_extension("jpg"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension("JPEG"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension("png"), Some("image/png"));
        assert_eq!(mime_type_for_extension("xyz"), None);
    }

    #[test]
    fn test_resolve_mime_type() {
        let file = ImageIdentifier::from_path("/sdcard/DCIM/IMG_1.JPG");
        assert_eq!(resolve_mime_type(&file), Some(JPEG_MIME_TYPE));

        let query = ImageIdentifier::parse("https://example.com/p/a.gif?size=2").unwrap();
        assert_eq!(resolve_mime_type(&query), Some("image/gif"));

        let indexed = ImageIdentifier::parse("content://media/external/images/media/7").unwrap();
        assert_eq!(resolve_mime_type(&indexed), None);
    }
}
