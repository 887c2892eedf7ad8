//! Test doubles for the renderer seams: a surface that records every call, a loader
//! with scripted results, and a clock that advances by a fixed step per read.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RenderError;
use crate::image::{Bitmap, ImageLoader};
use crate::metrics::Clock;
use crate::surface::Surface;

// =============================================================
// Images
// =============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MockImage {
    pub url: String,
    pub width: f64,
    pub height: f64,
}

impl Bitmap for MockImage {
    fn natural_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

// =============================================================
// Surface
// =============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Rotate { radians: f64 },
    Scale { x: f64, y: f64 },
    ClearRect { x: f64, y: f64, w: f64, h: f64 },
    FillRect { x: f64, y: f64, w: f64, h: f64, fill: String },
    StrokeRect { x: f64, y: f64, w: f64, h: f64, stroke: String, line_width: f64 },
    FillText { text: String, x: f64, y: f64, fill: String, font: String, align: String },
    DrawImage { url: String, x: f64, y: f64, w: f64, h: f64 },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: RefCell<Vec<DrawOp>>,
    fill: RefCell<String>,
    stroke: RefCell<String>,
    line_width: Cell<f64>,
    font: RefCell<String>,
    align: RefCell<String>,
    /// When set, `draw_image` fails.
    pub fail_draws: Cell<bool>,
}

impl RecordingSurface {
    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.borrow().clone()
    }

    /// URLs passed to `draw_image`, in call order.
    pub fn drawn_urls(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::DrawImage { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text passed to `fill_text`, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of error glyphs painted.
    pub fn error_glyphs(&self) -> usize {
        self.texts().iter().filter(|t| *t == "ERR").count()
    }

    fn push(&self, op: DrawOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl Surface for RecordingSurface {
    type Image = MockImage;

    fn save(&self) {
        self.push(DrawOp::Save);
    }

    fn restore(&self) {
        self.push(DrawOp::Restore);
    }

    fn translate(&self, x: f64, y: f64) -> Result<(), RenderError> {
        self.push(DrawOp::Translate { x, y });
        Ok(())
    }

    fn rotate(&self, radians: f64) -> Result<(), RenderError> {
        self.push(DrawOp::Rotate { radians });
        Ok(())
    }

    fn scale(&self, x: f64, y: f64) -> Result<(), RenderError> {
        self.push(DrawOp::Scale { x, y });
        Ok(())
    }

    fn set_fill_style(&self, color: &str) {
        *self.fill.borrow_mut() = color.to_owned();
    }

    fn set_stroke_style(&self, color: &str) {
        *self.stroke.borrow_mut() = color.to_owned();
    }

    fn set_line_width(&self, width: f64) {
        self.line_width.set(width);
    }

    fn set_font(&self, font: &str) {
        *self.font.borrow_mut() = font.to_owned();
    }

    fn set_text_align(&self, align: &str) {
        *self.align.borrow_mut() = align.to_owned();
    }

    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::ClearRect { x, y, w, h });
    }

    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        let fill = self.fill.borrow().clone();
        self.push(DrawOp::FillRect { x, y, w, h, fill });
    }

    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        let stroke = self.stroke.borrow().clone();
        self.push(DrawOp::StrokeRect { x, y, w, h, stroke, line_width: self.line_width.get() });
    }

    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        let op = DrawOp::FillText {
            text: text.to_owned(),
            x,
            y,
            fill: self.fill.borrow().clone(),
            font: self.font.borrow().clone(),
            align: self.align.borrow().clone(),
        };
        self.push(op);
        Ok(())
    }

    fn draw_image(&self, image: &MockImage, x: f64, y: f64, w: f64, h: f64) -> Result<(), RenderError> {
        if self.fail_draws.get() {
            return Err(RenderError::Surface("draw rejected".into()));
        }
        self.push(DrawOp::DrawImage { url: image.url.clone(), x, y, w, h });
        Ok(())
    }
}

// =============================================================
// Loader
// =============================================================

/// Loader event, shared with the test through [`ScriptedLoader::events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Start(String),
    Finish(String),
}

/// Serves configured URLs at fixed sizes; any other URL fails.
///
/// Each URL can be made to yield to the executor a number of times before it
/// resolves, which lets tests reorder completions.
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    sizes: HashMap<String, (f64, f64)>,
    yields: HashMap<String, usize>,
    events: Rc<RefCell<Vec<LoadEvent>>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    calls: Cell<usize>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, width: f64, height: f64) -> Self {
        self.sizes.insert(url.to_owned(), (width, height));
        self
    }

    pub fn with_yields(mut self, url: &str, yields: usize) -> Self {
        self.yields.insert(url.to_owned(), yields);
        self
    }

    pub fn events(&self) -> Rc<RefCell<Vec<LoadEvent>>> {
        Rc::clone(&self.events)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ImageLoader for ScriptedLoader {
    type Image = MockImage;

    async fn load(&self, url: &str) -> Result<MockImage, RenderError> {
        self.calls.set(self.calls.get() + 1);
        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight.set(self.max_in_flight.get().max(self.in_flight.get()));
        self.events.borrow_mut().push(LoadEvent::Start(url.to_owned()));

        for _ in 0..self.yields.get(url).copied().unwrap_or(0) {
            tokio::task::yield_now().await;
        }

        self.in_flight.set(self.in_flight.get() - 1);
        self.events.borrow_mut().push(LoadEvent::Finish(url.to_owned()));
        match self.sizes.get(url) {
            Some(&(width, height)) => Ok(MockImage { url: url.to_owned(), width, height }),
            None => Err(RenderError::ImageLoad { url: url.to_owned(), reason: "not found".into() }),
        }
    }
}

// =============================================================
// Clock
// =============================================================

/// Returns `0, step, 2*step, ...` on successive reads.
#[derive(Debug)]
pub struct StepClock {
    now: Cell<f64>,
    step: Cell<f64>,
}

impl StepClock {
    pub fn new(step: f64) -> Self {
        Self { now: Cell::new(0.0), step: Cell::new(step) }
    }

    pub fn set_step(&self, step: f64) {
        self.step.set(step);
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> f64 {
        let now = self.now.get();
        self.now.set(now + self.step.get());
        now
    }
}
