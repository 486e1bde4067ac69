//! Shared utilities for recognition engines.

use std::path::PathBuf;

use base64::Engine;

/// Locate a binary, either as a path or by name in PATH.
pub fn find_binary(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Check if a binary is available.
pub fn check_binary(name: &str) -> bool {
    find_binary(name).is_some()
}

/// File extension for an image MIME type, for tools that look at names.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/tiff" => "tif",
        "image/bmp" => "bmp",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Inline image bytes as a base64 `data:` URL.
pub fn image_data_url(image: &[u8], mime: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}
