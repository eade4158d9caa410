//! Timing utilities for projection kernels.
//!
//! Performance tracing is off unless enabled through [`configure`] (which
//! [`crate::init_global_tracing`] calls). Disabled spans cost one atomic load.
//!
//! ## Example
//!
//! ```rust
//! use tomo_tracing::performance::{record_projection, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("forward_projection", Some(100));
//! // ... project ...
//! drop(span); // Logs only if enabled and duration > 100μs
//!
//! record_projection("forward", "raycast_cpu", 4096, 11520, 850);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static PERF_ENABLED: AtomicBool = AtomicBool::new(false);
// `u64::MAX` encodes "no threshold".
static PERF_THRESHOLD_US: AtomicU64 = AtomicU64::new(u64::MAX);

/// Publish the process-wide performance tracing settings.
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    PERF_ENABLED.store(enabled, Ordering::Release);
    PERF_THRESHOLD_US.store(threshold_us.unwrap_or(u64::MAX), Ordering::Release);
}

/// Whether kernel timing spans are currently emitted.
pub fn is_enabled() -> bool {
    PERF_ENABLED.load(Ordering::Acquire)
}

/// Global threshold set through [`configure`], if any.
pub fn global_threshold_us() -> Option<u64> {
    match PERF_THRESHOLD_US.load(Ordering::Acquire) {
        u64::MAX => None,
        value => Some(value),
    }
}

/// RAII guard that measures a span and logs its duration on drop.
///
/// Nothing is logged when performance tracing is disabled or when the
/// duration stays below the threshold.
pub struct PerformanceSpan {
    threshold_us: Option<u64>,
    start_time: Instant,
    span: Option<tracing::Span>,
}

impl PerformanceSpan {
    /// Create a span. `threshold_us` overrides the global threshold.
    ///
    /// ```rust
    /// use tomo_tracing::performance::PerformanceSpan;
    ///
    /// let always = PerformanceSpan::new("always_log", None);
    /// let slow_only = PerformanceSpan::new("conditional", Some(100));
    /// ```
    pub fn new(span_name: &str, threshold_us: Option<u64>) -> Self {
        let span = is_enabled().then(|| tracing::debug_span!("perf", name = %span_name));
        Self {
            threshold_us: threshold_us.or_else(global_threshold_us),
            start_time: Instant::now(),
            span,
        }
    }

    /// Elapsed time since span creation.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Whether this span will log on drop (tracing was enabled at creation).
    pub fn is_recording(&self) -> bool {
        self.span.is_some()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        let Some(span) = &self.span else {
            return;
        };
        let elapsed_us = self.elapsed_us();
        if self.threshold_us.is_none_or(|t| elapsed_us >= t) {
            let _entered = span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Record one projection call.
///
/// Throughput is reported in processed rays-or-voxels per second, whichever
/// side is larger.
pub fn record_projection(direction: &str, backend: &str, input_len: usize, output_len: usize, duration_us: u64) {
    let samples = input_len.max(output_len);
    let throughput = if duration_us > 0 {
        samples as f64 / duration_us as f64 * 1_000_000.0
    } else {
        0.0
    };

    tracing::debug!(
        event = "projection",
        direction = direction,
        backend = backend,
        input_len = input_len,
        output_len = output_len,
        duration_us = duration_us,
        samples_per_sec = throughput,
        "projection_complete"
    );
}

/// Record construction of a device engine.
pub fn record_engine_build(backend: &str, gpu_index: usize, rays: usize, duration_us: u64) {
    tracing::debug!(
        event = "engine_build",
        backend = backend,
        gpu_index = gpu_index,
        rays = rays,
        duration_us = duration_us,
        "engine_built"
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Settings are process-global.
    pub(crate) static CONFIG_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn disabled_span_does_not_record() {
        let _guard = CONFIG_LOCK.lock().unwrap();
        configure(false, None);
        let span = PerformanceSpan::new("quiet", None);
        assert!(!span.is_recording());
    }

    #[test]
    fn enabled_span_records_and_respects_global_threshold() {
        let _guard = CONFIG_LOCK.lock().unwrap();
        configure(true, Some(500));
        assert_eq!(global_threshold_us(), Some(500));
        let span = PerformanceSpan::new("loud", None);
        assert!(span.is_recording());
        drop(span);
        configure(false, None);
        assert_eq!(global_threshold_us(), None);
    }

    #[test]
    fn record_helpers_do_not_panic() {
        record_projection("forward", "radon", 64 * 64, 180 * 64, 0);
        record_engine_build("raycast_cuda", 1, 11520, 1200);
    }
}
