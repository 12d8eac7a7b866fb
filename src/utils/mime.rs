//! MIME type detection for inlinable images.

use std::path::Path;

/// Image MIME type constants.
pub mod types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";
}

/// Guess an image MIME type from the file extension.
///
/// Returns `None` for anything that is not a known image format, so fonts and
/// other binary references are never turned into data URIs.
pub fn image_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(types::PNG),
        "jpg" | "jpeg" => Some(types::JPEG),
        "gif" => Some(types::GIF),
        "webp" => Some(types::WEBP),
        "svg" => Some(types::SVG),
        "ico" => Some(types::ICO),
        "bmp" => Some(types::BMP),
        _ => None,
    }
}
