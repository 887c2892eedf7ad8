//! Logical → device coordinate transforms.
//!
//! DESIGN
//! ======
//! Every function here is pure: the output depends only on the arguments and the
//! engine's fixed tolerance. That is what lets [`crate::transform_cache`] key results
//! on element id and logical position alone.
//!
//! Sub-pixel rounding snaps a coordinate onto a grid of `tolerance / dpr` CSS pixels,
//! i.e. `tolerance` device pixels. Snapping is idempotent, so a cached coordinate fed
//! back through the engine does not drift.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::Serialize;

use crate::options::RendererOptions;
use crate::viewport::{Point, Viewport};

/// How a scaled coordinate is rounded before it reaches the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Snap to the engine's sub-pixel grid.
    SubPixel,
    /// Snap to whole CSS pixels (no device-pixel-ratio factor).
    Pixel,
    /// Leave the scaled value untouched.
    Exact,
}

/// Horizontal / vertical scale pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

/// Rounding metadata carried alongside a transformed coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionMeta {
    pub rounding: Rounding,
    pub tolerance: f64,
}

/// A logical coordinate mapped into device space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformResult {
    pub x: f64,
    pub y: f64,
    pub original_x: f64,
    pub original_y: f64,
    pub scale: Scale,
    pub precision: PrecisionMeta,
}

impl TransformResult {
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Width / height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Image size at each stage of the scale chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageDimensions {
    /// Natural bitmap size.
    pub base: Size,
    /// After the element's own scale factors (logical units).
    pub scaled: Size,
    /// After the viewport scale (CSS pixels).
    pub display: Size,
    /// Half of `display`; the draw offset for center-anchored images.
    pub center: Point,
}

/// Bucket an accuracy error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyClass {
    PixelPerfect,
    SubPixel,
    Standard,
}

impl AccuracyClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PixelPerfect => "pixel-perfect",
            Self::SubPixel => "sub-pixel",
            Self::Standard => "standard",
        }
    }
}

/// Comparison of an actual device coordinate against an expected one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyCheck {
    /// Both axis deltas are within `tolerance`.
    pub within_tolerance: bool,
    /// Euclidean distance between actual and expected, in pixels.
    pub error_px: f64,
    /// Absolute per-axis deltas.
    pub delta: Point,
    pub tolerance: f64,
    pub classification: AccuracyClass,
}

/// Stateless transform math parameterized by the sub-pixel tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformEngine {
    tolerance: f64,
    subpixel_optimization: bool,
}

impl TransformEngine {
    #[must_use]
    pub fn new(tolerance: f64, subpixel_optimization: bool) -> Self {
        Self { tolerance, subpixel_optimization }
    }

    #[must_use]
    pub fn from_options(options: &RendererOptions) -> Self {
        Self::new(options.subpixel_tolerance, options.subpixel_optimization)
    }

    /// Base tolerance in pixels.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Snap `value` (CSS pixels) onto a grid of `tolerance` device pixels.
    #[must_use]
    pub fn quantize(&self, value: f64, device_pixel_ratio: f64) -> f64 {
        let steps = device_pixel_ratio / self.tolerance;
        (value * steps).round() / steps
    }

    /// Map a logical coordinate into device space.
    #[must_use]
    pub fn device_coordinates(&self, x: f64, y: f64, viewport: &Viewport, rounding: Rounding) -> TransformResult {
        let mut px = x * viewport.scale_x;
        let mut py = y * viewport.scale_y;
        let applied = match rounding {
            Rounding::SubPixel if self.subpixel_optimization => {
                px = self.quantize(px, viewport.device_pixel_ratio);
                py = self.quantize(py, viewport.device_pixel_ratio);
                Rounding::SubPixel
            }
            Rounding::SubPixel | Rounding::Exact => Rounding::Exact,
            Rounding::Pixel => {
                px = px.round();
                py = py.round();
                Rounding::Pixel
            }
        };
        TransformResult {
            x: px,
            y: py,
            original_x: x,
            original_y: y,
            scale: Scale { x: viewport.scale_x, y: viewport.scale_y },
            precision: PrecisionMeta { rounding: applied, tolerance: self.tolerance },
        }
    }

    /// Compute the on-screen size of a bitmap placed with the given element scale.
    ///
    /// With `sub_pixel`, the element-scaled size and the viewport-scaled size are each
    /// snapped to the tolerance grid.
    #[must_use]
    pub fn image_display_size(
        &self,
        natural_width: f64,
        natural_height: f64,
        element_scale_x: f64,
        element_scale_y: f64,
        viewport: &Viewport,
        sub_pixel: bool,
    ) -> ImageDimensions {
        let snap = sub_pixel && self.subpixel_optimization;
        let mut scaled = Size { width: natural_width * element_scale_x, height: natural_height * element_scale_y };
        if snap {
            scaled.width = self.quantize(scaled.width, 1.0);
            scaled.height = self.quantize(scaled.height, 1.0);
        }
        let mut display = Size { width: scaled.width * viewport.scale_x, height: scaled.height * viewport.scale_y };
        if snap {
            display.width = self.quantize(display.width, 1.0);
            display.height = self.quantize(display.height, 1.0);
        }
        ImageDimensions {
            base: Size { width: natural_width, height: natural_height },
            scaled,
            display,
            center: Point::new(display.width / 2.0, display.height / 2.0),
        }
    }

    /// Compare an actual device coordinate to the expected one.
    ///
    /// `tolerance` defaults to the engine's base tolerance.
    #[must_use]
    pub fn validate_accuracy(&self, actual: Point, expected: Point, tolerance: Option<f64>) -> AccuracyCheck {
        let tolerance = tolerance.unwrap_or(self.tolerance);
        let dx = (actual.x - expected.x).abs();
        let dy = (actual.y - expected.y).abs();
        let error_px = dx.hypot(dy);
        let classification = if error_px < self.tolerance {
            AccuracyClass::PixelPerfect
        } else if error_px < tolerance {
            AccuracyClass::SubPixel
        } else {
            AccuracyClass::Standard
        };
        AccuracyCheck {
            within_tolerance: dx <= tolerance && dy <= tolerance,
            error_px,
            delta: Point::new(dx, dy),
            tolerance,
            classification,
        }
    }
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::from_options(&RendererOptions::default())
    }
}
