//! Data-URI inlining of small images in stylesheets.

use std::fs;
use std::path::Path;

use base64::Engine;

use crate::utils::mime;

/// `data:` URI for `path` if it is an image no larger than `max_bytes`.
///
/// Anything unreadable, oversized, or not an image stays a normal URL.
pub fn data_uri(path: &Path, max_bytes: u64) -> Option<String> {
    let mime = mime::image_from_path(path)?;
    let len = fs::metadata(path).ok()?.len();
    if len > max_bytes {
        return None;
    }
    let bytes = fs::read(path).ok()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Some(format!("data:{mime};base64,{encoded}"))
}
