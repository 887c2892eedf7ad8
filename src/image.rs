//! Image loading and the per-renderer URL cache.
//!
//! Loaders are async: the browser loader suspends until the `<img>` element fires
//! `load` or `error`. The cache keeps every successfully decoded bitmap for the life
//! of the renderer and never evicts. Failures are not cached, so a broken URL is
//! retried on the next render pass.

#[cfg(test)]
#[path = "image_test.rs"]
mod image_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use tracing::debug;

use crate::error::RenderError;

/// A decoded bitmap the drawing surface can paint.
pub trait Bitmap: Clone {
    /// Intrinsic size in pixels as `(width, height)`.
    fn natural_size(&self) -> (f64, f64);
}

/// Source of decoded bitmaps.
pub trait ImageLoader {
    type Image: Bitmap;

    /// Fetch and decode the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ImageLoad`] on network or decode failure.
    fn load(&self, url: &str) -> impl Future<Output = Result<Self::Image, RenderError>>;
}

/// URL-keyed memo in front of an [`ImageLoader`].
pub struct ImageCache<L: ImageLoader> {
    loader: L,
    images: RefCell<HashMap<String, L::Image>>,
}

impl<L: ImageLoader> ImageCache<L> {
    pub fn new(loader: L) -> Self {
        Self { loader, images: RefCell::new(HashMap::new()) }
    }

    /// Return the cached bitmap for `url`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ImageLoad`] if `url` is empty or the loader fails.
    pub async fn load(&self, url: &str) -> Result<L::Image, RenderError> {
        if url.is_empty() {
            return Err(RenderError::ImageLoad { url: String::new(), reason: "empty url".into() });
        }
        if let Some(hit) = self.images.borrow().get(url) {
            return Ok(hit.clone());
        }

        let image = self.loader.load(url).await?;
        debug!(%url, "image loaded");
        self.images.borrow_mut().insert(url.to_owned(), image.clone());
        Ok(image)
    }

    /// Whether `url` has been loaded successfully before.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.images.borrow().contains_key(url)
    }

    /// Number of cached bitmaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }
}

impl<L: ImageLoader> fmt::Debug for ImageCache<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache").field("len", &self.len()).finish_non_exhaustive()
    }
}
