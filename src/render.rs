//! The render loop: draws one design view onto a [`Surface`].
//!
//! DESIGN
//! ======
//! `Renderer` is the browser-free core behind [`crate::engine::PreviewCanvas`]. It owns
//! every piece of per-preview state (viewport, transform cache, image cache,
//! metrics) so several previews can share a page without interfering.
//!
//! All methods take `&self`. The host event loop is single-threaded, so mutable state
//! sits in `Cell` / `RefCell` and no borrow is held across an `.await`. A second
//! `render_design` started while one is in flight is skipped, not queued.
//!
//! Image loads fan out with bounded concurrency but results are consumed in
//! document order, so later placements always paint over earlier ones regardless
//! of which download finishes first.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::accuracy::{self, AccuracyCase, AccuracyReport};
use crate::consts::{
    BACKGROUND_COLOR, ERROR_GLYPH_FILL, ERROR_GLYPH_FONT, ERROR_GLYPH_LINE_WIDTH_PX, ERROR_GLYPH_SIZE_PX,
    ERROR_GLYPH_STROKE, ERROR_GLYPH_TEXT_COLOR, LOADING_FONT, LOADING_TEXT_COLOR, LOGICAL_HEIGHT, LOGICAL_WIDTH,
};
use crate::doc::{DesignDocument, ElementPlacement};
use crate::error::RenderError;
use crate::image::{Bitmap, ImageCache, ImageLoader};
use crate::metrics::{BenchmarkReport, Clock, PerformanceMetrics, PerformanceReport};
use crate::options::RendererOptions;
use crate::surface::Surface;
use crate::transform::{Rounding, Scale, Size, TransformEngine};
use crate::transform_cache::{TransformCache, cache_key};
use crate::viewport::{Point, Viewport};

/// One image load awaited by every placement that uses its URL.
type SharedLoad<'a, I> = Shared<LocalBoxFuture<'a, Result<I, Rc<RenderError>>>>;

/// Whether a render pass is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderState {
    Idle,
    Rendering,
}

/// What a call to [`Renderer::render_design`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenderOutcome {
    /// Another pass was already running; nothing was drawn.
    Skipped,
    /// The document had no views or no placements; the surface was cleared.
    Empty,
    /// Every placement was either drawn or replaced by an error glyph.
    Rendered { drawn: usize, failed: usize },
}

/// Preview size at each level of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub logical: Size,
    /// CSS pixels.
    pub display: Size,
    /// Device pixels.
    pub backing: Size,
    pub scale: Scale,
    pub device_pixel_ratio: f64,
}

/// Resets the state to `Idle` on every exit path of a render pass.
struct RenderingGuard<'a>(&'a Cell<RenderState>);

impl<'a> RenderingGuard<'a> {
    fn enter(state: &'a Cell<RenderState>) -> Option<Self> {
        if state.get() == RenderState::Rendering {
            return None;
        }
        state.set(RenderState::Rendering);
        Some(Self(state))
    }
}

impl Drop for RenderingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(RenderState::Idle);
    }
}

pub struct Renderer<S, L, C>
where
    S: Surface,
    L: ImageLoader<Image = S::Image>,
    C: Clock,
{
    id: Uuid,
    options: RendererOptions,
    engine: TransformEngine,
    viewport: Cell<Viewport>,
    cache: RefCell<TransformCache>,
    images: ImageCache<L>,
    metrics: RefCell<PerformanceMetrics>,
    state: Cell<RenderState>,
    surface: S,
    clock: C,
}

impl<S, L, C> Renderer<S, L, C>
where
    S: Surface,
    L: ImageLoader<Image = S::Image>,
    C: Clock,
{
    /// Build a renderer for a container `container_width_px` CSS pixels wide.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidOptions`] if `options` fail validation,
    /// [`RenderError::InvalidContainer`] if the width is not positive.
    pub fn new(
        surface: S,
        loader: L,
        clock: C,
        options: RendererOptions,
        container_width_px: f64,
        device_pixel_ratio: f64,
    ) -> Result<Self, RenderError> {
        options.validate()?;
        let viewport = Viewport::new(container_width_px, device_pixel_ratio, options.max_display_width_px)?;
        let id = Uuid::new_v4();
        info!(
            renderer = %id,
            width = viewport.display_width_px,
            height = viewport.display_height_px,
            dpr = viewport.device_pixel_ratio,
            "renderer created"
        );
        Ok(Self {
            id,
            options,
            engine: TransformEngine::from_options(&options),
            viewport: Cell::new(viewport),
            cache: RefCell::new(TransformCache::new(options.transform_cache_capacity)),
            images: ImageCache::new(loader),
            metrics: RefCell::new(PerformanceMetrics::default()),
            state: Cell::new(RenderState::Idle),
            surface,
            clock,
        })
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state.get()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    // --- Rendering ---

    /// Draw the first view of `document`.
    ///
    /// Failed image loads are painted as error glyphs and counted in the outcome;
    /// they do not fail the pass.
    ///
    /// # Errors
    ///
    /// [`RenderError::Surface`] if the drawing surface rejects a call. The renderer
    /// returns to [`RenderState::Idle`] either way.
    pub async fn render_design(&self, document: &DesignDocument) -> Result<RenderOutcome, RenderError> {
        let Some(_guard) = RenderingGuard::enter(&self.state) else {
            info!(renderer = %self.id, "render already in progress, skipping");
            return Ok(RenderOutcome::Skipped);
        };

        let viewport = self.viewport.get();
        self.clear(&viewport);

        let Some((view_key, view)) = document.first_view() else {
            debug!(renderer = %self.id, "design has no views");
            return Ok(RenderOutcome::Empty);
        };
        if view.images.is_empty() {
            debug!(renderer = %self.id, view = view_key, "view has no images");
            return Ok(RenderOutcome::Empty);
        }
        info!(renderer = %self.id, view = view_key, images = view.images.len(), "rendering design");

        // Placements that share a URL share one load, so a repeated image is fetched once
        // even when both copies are in flight together.
        let mut by_url: HashMap<&str, SharedLoad<'_, L::Image>> = HashMap::new();
        let placements: Vec<_> = view
            .images
            .iter()
            .map(|placement| {
                let url = placement.url.as_str();
                let load = by_url
                    .entry(url)
                    .or_insert_with(|| async move { self.images.load(url).await.map_err(Rc::new) }.boxed_local().shared())
                    .clone();
                (placement, load)
            })
            .collect();

        let mut loads = pin!(
            stream::iter(placements)
                .map(|(placement, load)| async move {
                    let started_ms = self.clock.now_ms();
                    (placement, started_ms, load.await)
                })
                .buffered(self.options.image_concurrency)
        );

        let (mut drawn, mut failed) = (0, 0);
        while let Some((placement, started_ms, image)) = loads.next().await {
            match image {
                Ok(image) => {
                    self.draw_placement(placement, &image, &viewport)?;
                    self.record_timing(placement, self.clock.now_ms() - started_ms);
                    drawn += 1;
                }
                Err(err) => {
                    warn!(renderer = %self.id, element = %placement.id, error = %err, "image failed, drawing error glyph");
                    let t = &placement.transform;
                    let at = self.engine.device_coordinates(t.left, t.top, &viewport, Rounding::Exact);
                    self.draw_error_glyph(at.point())?;
                    failed += 1;
                }
            }
        }

        info!(renderer = %self.id, drawn, failed, "design rendered");
        Ok(RenderOutcome::Rendered { drawn, failed })
    }

    /// Paint `loading_text`, wait on `pause`, then render.
    ///
    /// `pause` gives the host a chance to present the caption before image loads
    /// begin. Skipped without drawing if a pass is already running.
    ///
    /// # Errors
    ///
    /// As [`Self::render_design`].
    pub async fn render_with_loading<P>(
        &self,
        document: &DesignDocument,
        loading_text: &str,
        pause: P,
    ) -> Result<RenderOutcome, RenderError>
    where
        P: Future<Output = ()>,
    {
        if self.state.get() == RenderState::Rendering {
            info!(renderer = %self.id, "render already in progress, skipping");
            return Ok(RenderOutcome::Skipped);
        }
        self.draw_loading(loading_text)?;
        pause.await;
        self.render_design(document).await
    }

    /// Clear the preview and paint a centered caption.
    ///
    /// # Errors
    ///
    /// [`RenderError::Surface`] if the text cannot be drawn.
    pub fn draw_loading(&self, text: &str) -> Result<(), RenderError> {
        let viewport = self.viewport.get();
        self.clear(&viewport);
        let center = viewport.center();
        self.surface.set_fill_style(LOADING_TEXT_COLOR);
        self.surface.set_font(LOADING_FONT);
        self.surface.set_text_align("center");
        self.surface.fill_text(text, center.x, center.y)
    }

    /// Render `document` `iterations` times back to back and report the timings.
    ///
    /// # Errors
    ///
    /// The first error any pass returns.
    pub async fn benchmark(&self, document: &DesignDocument, iterations: usize) -> Result<BenchmarkReport, RenderError> {
        let started_ms = self.clock.now_ms();
        let mut samples_ms = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let pass_started_ms = self.clock.now_ms();
            self.render_design(document).await?;
            samples_ms.push(self.clock.now_ms() - pass_started_ms);
        }
        let report = BenchmarkReport::from_samples(samples_ms, self.clock.now_ms() - started_ms);
        info!(renderer = %self.id, iterations, average_ms = report.average_ms, "benchmark finished");
        Ok(report)
    }

    // --- Viewport ---

    /// Recompute the viewport for a new container width. Returns `true` when the
    /// scale changed, in which case every cached transform is dropped.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidContainer`] if the width is not positive; nothing changes.
    pub fn resize(&self, container_width_px: f64) -> Result<bool, RenderError> {
        let mut viewport = self.viewport.get();
        let changed = viewport.resize(container_width_px)?;
        self.viewport.set(viewport);
        if changed {
            self.cache.borrow_mut().invalidate_all();
            info!(
                renderer = %self.id,
                width = viewport.display_width_px,
                scale_x = viewport.scale_x,
                "viewport resized, transform cache cleared"
            );
        }
        Ok(changed)
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let viewport = self.viewport.get();
        Dimensions {
            logical: Size { width: LOGICAL_WIDTH, height: LOGICAL_HEIGHT },
            display: Size { width: viewport.display_width_px, height: viewport.display_height_px },
            backing: Size { width: viewport.backing_width_px(), height: viewport.backing_height_px() },
            scale: Scale { x: viewport.scale_x, y: viewport.scale_y },
            device_pixel_ratio: viewport.device_pixel_ratio,
        }
    }

    // --- Diagnostics ---

    #[must_use]
    pub fn performance_report(&self) -> PerformanceReport {
        PerformanceReport {
            metrics: *self.metrics.borrow(),
            cache_size: self.cache.borrow().len(),
            image_cache_size: self.images.len(),
        }
    }

    /// Check the sub-pixel transform against `cases`, or the built-in reference
    /// placements when `cases` is empty.
    #[must_use]
    pub fn test_transform_accuracy(&self, cases: &[AccuracyCase]) -> AccuracyReport {
        let report = accuracy::run(&self.engine, &self.viewport.get(), cases);
        info!(renderer = %self.id, passed = report.passed, failed = report.failed, "transform accuracy checked");
        report
    }

    // --- Painting ---

    fn clear(&self, viewport: &Viewport) {
        let (w, h) = (viewport.display_width_px, viewport.display_height_px);
        self.surface.clear_rect(0.0, 0.0, w, h);
        self.surface.set_fill_style(BACKGROUND_COLOR);
        self.surface.fill_rect(0.0, 0.0, w, h);
    }

    fn draw_placement(&self, placement: &ElementPlacement, image: &S::Image, viewport: &Viewport) -> Result<(), RenderError> {
        let t = &placement.transform;
        let key = cache_key(&placement.id, t.left, t.top);
        let now_ms = self.clock.now_ms();
        let position = self.cache.borrow_mut().get_or_compute(&key, t.left, t.top, viewport, &self.engine, now_ms);

        let (natural_w, natural_h) = image.natural_size();
        let size = self.engine.image_display_size(natural_w, natural_h, t.scale_x, t.scale_y, viewport, true);

        self.surface.save();
        let painted = self.paint_image(image, position.point(), t.angle_radians(), size.display, size.center);
        self.surface.restore();
        painted?;

        let naive = viewport.logical_to_display(Point::new(t.left, t.top));
        let check = self.engine.validate_accuracy(position.point(), naive, None);
        if !check.within_tolerance {
            warn!(
                renderer = %self.id,
                element = %placement.id,
                error_px = check.error_px,
                class = check.classification.as_str(),
                "placement outside accuracy tolerance"
            );
        }
        Ok(())
    }

    fn paint_image(&self, image: &S::Image, at: Point, radians: f64, size: Size, center: Point) -> Result<(), RenderError> {
        self.surface.translate(at.x, at.y)?;
        if radians != 0.0 {
            self.surface.rotate(radians)?;
        }
        self.surface.draw_image(image, -center.x, -center.y, size.width, size.height)
    }

    fn draw_error_glyph(&self, at: Point) -> Result<(), RenderError> {
        let half = ERROR_GLYPH_SIZE_PX / 2.0;
        self.surface.save();
        self.surface.set_fill_style(ERROR_GLYPH_FILL);
        self.surface.fill_rect(at.x - half, at.y - half, ERROR_GLYPH_SIZE_PX, ERROR_GLYPH_SIZE_PX);
        self.surface.set_stroke_style(ERROR_GLYPH_STROKE);
        self.surface.set_line_width(ERROR_GLYPH_LINE_WIDTH_PX);
        self.surface.stroke_rect(at.x - half, at.y - half, ERROR_GLYPH_SIZE_PX, ERROR_GLYPH_SIZE_PX);
        self.surface.set_fill_style(ERROR_GLYPH_TEXT_COLOR);
        self.surface.set_font(ERROR_GLYPH_FONT);
        self.surface.set_text_align("center");
        let labelled = self.surface.fill_text("ERR", at.x, at.y + 4.0);
        self.surface.restore();
        labelled
    }

    fn record_timing(&self, placement: &ElementPlacement, elapsed_ms: f64) {
        self.metrics.borrow_mut().record(elapsed_ms);
        if elapsed_ms > self.options.slow_render_threshold_ms {
            warn!(
                renderer = %self.id,
                element = %placement.id,
                elapsed_ms,
                threshold_ms = self.options.slow_render_threshold_ms,
                "slow placement render"
            );
        }
    }
}
