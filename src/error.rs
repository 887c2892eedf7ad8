//! Error taxonomy for the preview renderer.
//!
//! Only [`RenderError::InvalidContainer`], [`RenderError::InvalidOptions`] and surface
//! failures abort a call. [`RenderError::ImageLoad`] is recovered per placement by the
//! render loop, which draws an error glyph and moves on. Accuracy and performance
//! problems are log events, not errors.

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid container: {0}")]
    InvalidContainer(String),
    #[error("failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },
    #[error("drawing surface error: {0}")]
    Surface(String),
    #[error("invalid design document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("invalid renderer options: {0}")]
    InvalidOptions(String),
}

impl RenderError {
    /// Whether the render loop recovers from this error without aborting the pass.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ImageLoad { .. })
    }
}
