//! Render timing: the clock abstraction and running per-placement statistics.

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;

use std::fmt;

use serde::Serialize;

/// Monotonic millisecond clock. The browser implementation is
/// [`crate::engine::PerformanceClock`].
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Running statistics over completed placement renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_renders: u64,
    pub average_render_time_ms: f64,
    /// `None` until the first sample.
    pub fastest_render_ms: Option<f64>,
    pub slowest_render_ms: f64,
}

impl PerformanceMetrics {
    /// Fold one placement's elapsed time into the aggregate.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, elapsed_ms: f64) {
        self.total_renders += 1;
        self.average_render_time_ms += (elapsed_ms - self.average_render_time_ms) / self.total_renders as f64;
        self.fastest_render_ms = Some(self.fastest_render_ms.map_or(elapsed_ms, |f| f.min(elapsed_ms)));
        self.slowest_render_ms = self.slowest_render_ms.max(elapsed_ms);
    }
}

/// Snapshot returned by `performance_report`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceReport {
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    pub cache_size: usize,
    pub image_cache_size: usize,
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        write!(
            f,
            "{} renders, avg {:.2}ms, fastest {}, slowest {:.2}ms, {} cached transforms, {} cached images",
            m.total_renders,
            m.average_render_time_ms,
            m.fastest_render_ms.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.2}ms")),
            m.slowest_render_ms,
            self.cache_size,
            self.image_cache_size,
        )
    }
}

/// Timings from [`crate::render::Renderer::benchmark`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub iterations: usize,
    pub total_ms: f64,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub samples_ms: Vec<f64>,
}

impl BenchmarkReport {
    /// Summarize per-iteration samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples_ms: Vec<f64>, total_ms: f64) -> Self {
        if samples_ms.is_empty() {
            return Self { total_ms, ..Self::default() };
        }
        let sum: f64 = samples_ms.iter().sum();
        let min_ms = samples_ms.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = samples_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            iterations: samples_ms.len(),
            total_ms,
            average_ms: sum / samples_ms.len() as f64,
            min_ms,
            max_ms,
            samples_ms,
        }
    }
}
