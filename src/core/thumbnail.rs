//! Thumbnail loading with placeholder fallback

use tracing::debug;

use super::backend::BackendClient;
use crate::types::AnalysisResult;

/// Shown when there is no usable image
pub const PLACEHOLDER_GLYPH: &str = "🎞";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Image { src: String, bytes: Vec<u8> },
    Placeholder,
}

/// Load the result's thumbnail through the backend; never fails
pub async fn load(backend: &BackendClient, result: &AnalysisResult) -> Thumbnail {
    let Some(thumbnail) = result.thumbnail.as_deref().filter(|t| !t.is_empty()) else {
        return Thumbnail::Placeholder;
    };

    let src = backend.thumbnail_src(thumbnail);
    match backend.fetch_thumbnail(&src).await {
        Ok(bytes) if !bytes.is_empty() => Thumbnail::Image { src, bytes },
        Ok(_) => Thumbnail::Placeholder,
        Err(e) => {
            debug!(error = %e, src = %src, "thumbnail unavailable");
            Thumbnail::Placeholder
        }
    }
}
