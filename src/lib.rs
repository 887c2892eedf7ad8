//! Print-accurate design preview renderer for the product designer admin.
//!
//! A design places customer images on a fixed 254×302 logical canvas (the print
//! area in millimetres ÷ 10). This crate maps those placements onto an on-screen
//! canvas of whatever width the admin page gives it, with sub-pixel rounding that
//! keeps every placement within a tenth of a device pixel of its exact position.
//! It compiles to WebAssembly for the browser; the core is generic over the drawing
//! surface, image loader, and clock so it runs and tests natively.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Browser [`engine::PreviewCanvas`] and the canvas / image / clock bindings |
//! | [`render`] | Testable render loop, [`render::Renderer`] |
//! | [`viewport`] | Logical ↔ display sizing and scale factors |
//! | [`transform`] | Stateless logical → device coordinate math |
//! | [`transform_cache`] | Bounded FIFO memo of computed transforms |
//! | [`image`] | Image loader trait and the per-renderer bitmap cache |
//! | [`surface`] | 2D drawing surface trait |
//! | [`doc`] | Design document model and structural validation |
//! | [`accuracy`] | Transform accuracy self-test |
//! | [`metrics`] | Clock trait, render timing, benchmark reports |
//! | [`options`] | Per-renderer configuration |
//! | [`error`] | [`error::RenderError`] |
//! | [`consts`] | Shared constants (logical size, defaults, glyph styling) |

pub mod accuracy;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod image;
pub mod metrics;
pub mod options;
pub mod render;
pub mod surface;
pub mod transform;
pub mod transform_cache;
pub mod viewport;

#[cfg(test)]
mod test_helpers;
