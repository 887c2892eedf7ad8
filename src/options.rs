//! Renderer tuning options.
//!
//! The host passes options as a JSON object (camelCase keys). Every field is optional
//! and falls back to the `DEFAULT_*` constants in [`crate::consts`].

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_IMAGE_CONCURRENCY, DEFAULT_LOADING_DELAY_MS, DEFAULT_MAX_DISPLAY_WIDTH_PX, DEFAULT_SLOW_RENDER_THRESHOLD_MS,
    DEFAULT_SUBPIXEL_TOLERANCE, DEFAULT_TRANSFORM_CACHE_CAPACITY,
};
use crate::error::RenderError;

/// Tuning knobs for a single renderer instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererOptions {
    /// Quantization step for sub-pixel rounding, in device-independent pixels.
    pub subpixel_tolerance: f64,
    /// When false, sub-pixel rounding requests are served with exact coordinates.
    pub subpixel_optimization: bool,
    /// Upper bound on the preview's CSS width.
    pub max_display_width_px: f64,
    /// Transform cache entry cap.
    pub transform_cache_capacity: usize,
    /// Per-placement render time that triggers a performance warning.
    pub slow_render_threshold_ms: f64,
    /// Image loads kept in flight during a render pass.
    pub image_concurrency: usize,
    /// Pause between the loading caption and the real render, in milliseconds.
    pub loading_delay_ms: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            subpixel_tolerance: DEFAULT_SUBPIXEL_TOLERANCE,
            subpixel_optimization: true,
            max_display_width_px: DEFAULT_MAX_DISPLAY_WIDTH_PX,
            transform_cache_capacity: DEFAULT_TRANSFORM_CACHE_CAPACITY,
            slow_render_threshold_ms: DEFAULT_SLOW_RENDER_THRESHOLD_MS,
            image_concurrency: DEFAULT_IMAGE_CONCURRENCY,
            loading_delay_ms: DEFAULT_LOADING_DELAY_MS,
        }
    }
}

impl RendererOptions {
    /// Parse host-supplied options. An empty string yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Document`] for malformed JSON and
    /// [`RenderError::InvalidOptions`] when a value is out of range.
    pub fn from_json(raw: &str) -> Result<Self, RenderError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let options: Self = serde_json::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the renderer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] naming the first offending field.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.subpixel_tolerance > 0.0 && self.subpixel_tolerance.is_finite()) {
            return Err(RenderError::InvalidOptions(format!(
                "subpixelTolerance must be positive, got {}",
                self.subpixel_tolerance
            )));
        }
        if !(self.max_display_width_px > 0.0 && self.max_display_width_px.is_finite()) {
            return Err(RenderError::InvalidOptions(format!(
                "maxDisplayWidthPx must be positive, got {}",
                self.max_display_width_px
            )));
        }
        if self.transform_cache_capacity == 0 {
            return Err(RenderError::InvalidOptions("transformCacheCapacity must be at least 1".into()));
        }
        if self.image_concurrency == 0 {
            return Err(RenderError::InvalidOptions("imageConcurrency must be at least 1".into()));
        }
        if self.slow_render_threshold_ms.is_nan() || self.slow_render_threshold_ms < 0.0 {
            return Err(RenderError::InvalidOptions(format!(
                "slowRenderThresholdMs must be non-negative, got {}",
                self.slow_render_threshold_ms
            )));
        }
        Ok(())
    }
}
