//! Shared numeric constants for the preview renderer.

// ── Logical canvas ──────────────────────────────────────────────

/// Width of the design space in logical units (25.4 cm print area).
pub const LOGICAL_WIDTH: f64 = 254.0;

/// Height of the design space in logical units (30.2 cm print area).
pub const LOGICAL_HEIGHT: f64 = 302.0;

// ── Option defaults ─────────────────────────────────────────────

/// Upper bound on the CSS width of the preview, in pixels.
pub const DEFAULT_MAX_DISPLAY_WIDTH_PX: f64 = 600.0;

/// Sub-pixel quantization step in device-independent pixels.
pub const DEFAULT_SUBPIXEL_TOLERANCE: f64 = 0.1;

/// Transform cache entry cap before FIFO eviction kicks in.
pub const DEFAULT_TRANSFORM_CACHE_CAPACITY: usize = 1000;

/// Per-placement render time above which a performance warning is logged.
pub const DEFAULT_SLOW_RENDER_THRESHOLD_MS: f64 = 5.0;

/// Number of image loads kept in flight during a render pass.
pub const DEFAULT_IMAGE_CONCURRENCY: usize = 4;

/// Pause after painting the loading caption, so the browser gets a frame.
pub const DEFAULT_LOADING_DELAY_MS: u32 = 100;

// ── Painting ────────────────────────────────────────────────────

/// Background fill for a cleared preview.
pub const BACKGROUND_COLOR: &str = "#ffffff";

/// Edge length of the error glyph drawn for a placement whose image failed.
pub const ERROR_GLYPH_SIZE_PX: f64 = 30.0;

/// Error glyph fill.
pub const ERROR_GLYPH_FILL: &str = "#ff4444";

/// Error glyph border.
pub const ERROR_GLYPH_STROKE: &str = "#cc0000";

/// Loading caption color.
pub const LOADING_TEXT_COLOR: &str = "#666666";

/// Font shared by the loading caption.
pub const LOADING_FONT: &str = "14px Arial, sans-serif";

/// Font for the "ERR" label inside the error glyph.
pub const ERROR_GLYPH_FONT: &str = "12px Arial, sans-serif";

/// Error glyph border width.
pub const ERROR_GLYPH_LINE_WIDTH_PX: f64 = 2.0;

/// Error glyph label color.
pub const ERROR_GLYPH_TEXT_COLOR: &str = "#ffffff";
