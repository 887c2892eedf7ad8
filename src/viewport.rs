#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::error::RenderError;

/// A point in either logical (design) space or device (CSS pixel) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mapping between the fixed 254×302 logical canvas and the on-screen preview.
///
/// `display_*` are CSS pixels. The backing store is `display * device_pixel_ratio`
/// device pixels; the drawing surface is pre-scaled by the ratio, so render code
/// works in CSS pixels throughout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub container_width_px: f64,
    pub device_pixel_ratio: f64,
    pub display_width_px: f64,
    pub display_height_px: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    max_display_width_px: f64,
}

impl Viewport {
    /// Size a viewport for a container of the given CSS width.
    ///
    /// Ratios below 1 (or non-finite) are clamped to 1.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidContainer`] if `container_width_px` is not positive.
    pub fn new(container_width_px: f64, device_pixel_ratio: f64, max_display_width_px: f64) -> Result<Self, RenderError> {
        check_container_width(container_width_px)?;
        let dpr = if device_pixel_ratio.is_finite() { device_pixel_ratio.max(1.0) } else { 1.0 };
        let mut viewport = Self {
            container_width_px,
            device_pixel_ratio: dpr,
            display_width_px: 0.0,
            display_height_px: 0.0,
            scale_x: 0.0,
            scale_y: 0.0,
            max_display_width_px,
        };
        viewport.recompute();
        Ok(viewport)
    }

    /// Recompute for a new container width. Returns `true` when either scale factor changed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidContainer`] if `container_width_px` is not positive;
    /// the viewport is left as it was.
    #[allow(clippy::float_cmp)]
    pub fn resize(&mut self, container_width_px: f64) -> Result<bool, RenderError> {
        check_container_width(container_width_px)?;
        let (old_x, old_y) = (self.scale_x, self.scale_y);
        self.container_width_px = container_width_px;
        self.recompute();
        Ok(old_x != self.scale_x || old_y != self.scale_y)
    }

    /// Backing-store width in device pixels.
    #[must_use]
    pub fn backing_width_px(&self) -> f64 {
        self.display_width_px * self.device_pixel_ratio
    }

    /// Backing-store height in device pixels.
    #[must_use]
    pub fn backing_height_px(&self) -> f64 {
        self.display_height_px * self.device_pixel_ratio
    }

    /// Center of the preview in CSS pixels.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.display_width_px / 2.0, self.display_height_px / 2.0)
    }

    /// Scale a logical point by the viewport alone, with no rounding.
    #[must_use]
    pub fn logical_to_display(&self, logical: Point) -> Point {
        Point::new(logical.x * self.scale_x, logical.y * self.scale_y)
    }

    fn recompute(&mut self) {
        self.display_width_px = self.container_width_px.min(self.max_display_width_px);
        self.display_height_px = self.display_width_px * (LOGICAL_HEIGHT / LOGICAL_WIDTH);
        self.scale_x = self.display_width_px / LOGICAL_WIDTH;
        self.scale_y = self.display_height_px / LOGICAL_HEIGHT;
    }
}

fn check_container_width(width_px: f64) -> Result<(), RenderError> {
    if width_px > 0.0 && width_px.is_finite() {
        Ok(())
    } else {
        Err(RenderError::InvalidContainer(format!("width {width_px}px")))
    }
}
