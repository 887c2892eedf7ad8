//! Browser binding: mounts a `<canvas>` into a container element and drives the
//! [`Renderer`] core through `CanvasRenderingContext2d`.
//!
//! Everything that touches the DOM lives here; the render loop itself is tested
//! natively against the doubles in `test_helpers`.

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlImageElement, Performance, Window};

use crate::accuracy::{AccuracyCase, AccuracyReport};
use crate::doc::{DesignDocument, DesignValidation, validate_design};
use crate::error::RenderError;
use crate::image::{Bitmap, ImageLoader};
use crate::metrics::{BenchmarkReport, Clock, PerformanceReport};
use crate::options::RendererOptions;
use crate::render::{Dimensions, RenderOutcome, Renderer};
use crate::surface::Surface;

fn js_error(context: &str, err: &JsValue) -> RenderError {
    RenderError::Surface(format!("{context}: {err:?}"))
}

// =============================================================
// Surface
// =============================================================

/// [`Surface`] over a 2D canvas context.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Bitmap for HtmlImageElement {
    fn natural_size(&self) -> (f64, f64) {
        (f64::from(self.natural_width()), f64::from(self.natural_height()))
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn save(&self) {
        self.ctx.save();
    }

    fn restore(&self) {
        self.ctx.restore();
    }

    fn translate(&self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.translate(x, y).map_err(|e| js_error("translate", &e))
    }

    fn rotate(&self, radians: f64) -> Result<(), RenderError> {
        self.ctx.rotate(radians).map_err(|e| js_error("rotate", &e))
    }

    fn scale(&self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.scale(x, y).map_err(|e| js_error("scale", &e))
    }

    fn set_fill_style(&self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_stroke_style(&self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_line_width(&self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_font(&self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&self, align: &str) {
        self.ctx.set_text_align(align);
    }

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.clear_rect(x, y, w, h);
    }

    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.stroke_rect(x, y, w, h);
    }

    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.fill_text(text, x, y).map_err(|e| js_error("fill_text", &e))
    }

    fn draw_image(&self, image: &HtmlImageElement, x: f64, y: f64, w: f64, h: f64) -> Result<(), RenderError> {
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h)
            .map_err(|e| js_error("draw_image", &e))
    }
}

// =============================================================
// Loader and clock
// =============================================================

/// Loads through an `<img>` element with anonymous CORS so the canvas stays
/// exportable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
    type Image = HtmlImageElement;

    async fn load(&self, url: &str) -> Result<HtmlImageElement, RenderError> {
        let load_error = |reason: String| RenderError::ImageLoad { url: url.to_owned(), reason };

        let image = HtmlImageElement::new().map_err(|e| load_error(format!("{e:?}")))?;
        image.set_cross_origin(Some("anonymous"));
        let pending = image.clone();
        let settled = js_sys::Promise::new(&mut |resolve, reject| {
            pending.set_onload(Some(&resolve));
            pending.set_onerror(Some(&reject));
        });
        image.set_src(url);

        let loaded = JsFuture::from(settled).await;
        image.set_onload(None);
        image.set_onerror(None);
        loaded.map_err(|_| load_error("image failed to load".into()))?;
        Ok(image)
    }
}

/// [`Clock`] over `window.performance`, falling back to `Date.now()`.
#[derive(Debug, Clone)]
pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl PerformanceClock {
    #[must_use]
    pub fn new(window: &Window) -> Self {
        Self { performance: window.performance() }
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        self.performance.as_ref().map_or_else(js_sys::Date::now, Performance::now)
    }
}

// =============================================================
// PreviewCanvas
// =============================================================

/// A live preview mounted in the page.
pub struct PreviewCanvas {
    container: Element,
    canvas: HtmlCanvasElement,
    renderer: Renderer<CanvasSurface, HtmlImageLoader, PerformanceClock>,
}

impl PreviewCanvas {
    /// Create a canvas inside the element with id `container_id`, sized to its width.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidContainer`] if the element is missing or has no width,
    /// [`RenderError::InvalidOptions`] for bad options, [`RenderError::Surface`] if
    /// the canvas or its 2D context cannot be created.
    pub fn mount(container_id: &str, options: RendererOptions) -> Result<Self, RenderError> {
        let window = web_sys::window().ok_or_else(|| RenderError::InvalidContainer("no window".into()))?;
        let document = window.document().ok_or_else(|| RenderError::InvalidContainer("no document".into()))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| RenderError::InvalidContainer(format!("#{container_id} not found")))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|e| js_error("create canvas", &e))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| RenderError::Surface("created element is not a canvas".into()))?;
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| js_error("get context", &e))?
            .ok_or_else(|| RenderError::Surface("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Surface("context is not 2d".into()))?;

        let renderer = Renderer::new(
            CanvasSurface::new(ctx),
            HtmlImageLoader,
            PerformanceClock::new(&window),
            options,
            f64::from(container.client_width()),
            window.device_pixel_ratio(),
        )?;
        container.append_child(&canvas).map_err(|e| js_error("append canvas", &e))?;

        let preview = Self { container, canvas, renderer };
        preview.size_backing_store()?;
        Ok(preview)
    }

    // --- Rendering ---

    /// # Errors
    ///
    /// As [`Renderer::render_design`].
    pub async fn render_design(&self, document: &DesignDocument) -> Result<RenderOutcome, RenderError> {
        self.renderer.render_design(document).await
    }

    /// Parse a design JSON string and render it.
    ///
    /// # Errors
    ///
    /// [`RenderError::Document`] for malformed JSON, otherwise as
    /// [`Renderer::render_design`].
    pub async fn render_json(&self, raw: &str) -> Result<RenderOutcome, RenderError> {
        let document = DesignDocument::from_json(raw)?;
        self.renderer.render_design(&document).await
    }

    /// Paint `loading_text`, give the browser `loadingDelayMs` to present it, then render.
    ///
    /// # Errors
    ///
    /// As [`Renderer::render_design`].
    pub async fn render_with_loading(
        &self,
        document: &DesignDocument,
        loading_text: &str,
    ) -> Result<RenderOutcome, RenderError> {
        let pause = TimeoutFuture::new(self.renderer.options().loading_delay_ms);
        self.renderer.render_with_loading(document, loading_text, pause).await
    }

    /// # Errors
    ///
    /// As [`Renderer::benchmark`].
    pub async fn benchmark(&self, document: &DesignDocument, iterations: usize) -> Result<BenchmarkReport, RenderError> {
        self.renderer.benchmark(document, iterations).await
    }

    // --- Viewport ---

    /// Re-read the container width. When the scale changed, the backing store is
    /// resized and cached transforms are dropped. The caller re-renders.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidContainer`] if the container collapsed to zero width.
    pub fn handle_viewport_resize(&self) -> Result<bool, RenderError> {
        let changed = self.renderer.resize(f64::from(self.container.client_width()))?;
        if changed {
            self.size_backing_store()?;
        }
        Ok(changed)
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.renderer.dimensions()
    }

    // --- Export and diagnostics ---

    /// Encode the canvas as a data URL. `format` is a MIME type; PNG when `None`.
    ///
    /// # Errors
    ///
    /// [`RenderError::Surface`] if the canvas is tainted or the encoder fails.
    pub fn export_as_data_url(&self, format: Option<&str>) -> Result<String, RenderError> {
        self.canvas
            .to_data_url_with_type(format.unwrap_or("image/png"))
            .map_err(|e| js_error("export", &e))
    }

    #[must_use]
    pub fn performance_report(&self) -> PerformanceReport {
        self.renderer.performance_report()
    }

    #[must_use]
    pub fn test_transform_accuracy(&self, cases: &[AccuracyCase]) -> AccuracyReport {
        self.renderer.test_transform_accuracy(cases)
    }

    /// Structural check of a design JSON string before rendering.
    ///
    /// # Errors
    ///
    /// [`RenderError::Document`] if `raw` is not JSON at all.
    pub fn validate_design(raw: &str) -> Result<DesignValidation, RenderError> {
        Ok(validate_design(&serde_json::from_str(raw)?))
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer<CanvasSurface, HtmlImageLoader, PerformanceClock> {
        &self.renderer
    }

    /// Size the canvas to the viewport: CSS size from the display dimensions, backing
    /// store from the device pixels, then pre-scale the context by the ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn size_backing_store(&self) -> Result<(), RenderError> {
        let d = self.renderer.dimensions();
        self.canvas.set_width(d.backing.width.round() as u32);
        self.canvas.set_height(d.backing.height.round() as u32);

        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", d.display.width))
            .map_err(|e| js_error("style width", &e))?;
        style
            .set_property("height", &format!("{}px", d.display.height))
            .map_err(|e| js_error("style height", &e))?;

        // Resizing the backing store resets the context transform.
        self.renderer.surface().scale(d.device_pixel_ratio, d.device_pixel_ratio)
    }
}
