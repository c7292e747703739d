use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ServiceError;

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads an image from disk into a `data:` URL the service accepts inline.
pub async fn encode_image_file(path: impl AsRef<Path>) -> Result<String, ServiceError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "encoded image");
    Ok(to_data_url(mime_for_path(path), &bytes))
}

/// URLs pass through untouched; anything else is read as a local file.
pub async fn resolve_image_source(source: &str) -> Result<String, ServiceError> {
    if is_remote(source) {
        return Ok(source.to_string());
    }
    encode_image_file(source).await
}

fn is_remote(source: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|scheme| source.starts_with(scheme))
}
