//! The 2D immediate-mode drawing surface the renderer paints into.
//!
//! Shaped after `CanvasRenderingContext2d`: state is a stack (`save` / `restore`),
//! transforms compose onto the current matrix, and style setters affect subsequent
//! fills and strokes. Coordinates are CSS pixels; the implementation is expected to
//! have applied the device pixel ratio already.

use crate::error::RenderError;
use crate::image::Bitmap;

pub trait Surface {
    type Image: Bitmap;

    fn save(&self);
    fn restore(&self);

    /// # Errors
    /// Returns [`RenderError::Surface`] if the backend rejects the transform.
    fn translate(&self, x: f64, y: f64) -> Result<(), RenderError>;

    /// # Errors
    /// Returns [`RenderError::Surface`] if the backend rejects the transform.
    fn rotate(&self, radians: f64) -> Result<(), RenderError>;

    /// # Errors
    /// Returns [`RenderError::Surface`] if the backend rejects the transform.
    fn scale(&self, x: f64, y: f64) -> Result<(), RenderError>;

    fn set_fill_style(&self, color: &str);
    fn set_stroke_style(&self, color: &str);
    fn set_line_width(&self, width: f64);
    fn set_font(&self, font: &str);
    fn set_text_align(&self, align: &str);

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64);

    /// # Errors
    /// Returns [`RenderError::Surface`] if the backend fails to draw text.
    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;

    /// Draw `image` stretched into the `w` × `h` box at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`RenderError::Surface`] if the backend fails to draw the bitmap.
    fn draw_image(&self, image: &Self::Image, x: f64, y: f64, w: f64, h: f64) -> Result<(), RenderError>;
}
