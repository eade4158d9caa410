//! Timing span macro used around projection calls and engine builds.

/// Create a [`crate::performance::PerformanceSpan`], optionally entering a
/// `debug` span carrying extra fields.
///
/// ```rust
/// use tomo_tracing::perf_span;
///
/// {
///     let _span = perf_span!("forward_projection", rays = 11520, backend = "radon");
///     // ... projection ...
/// }
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        let _span = tracing::debug_span!(
            "perf",
            name = $name,
            $($field = $value),+
        ).entered();
        $crate::performance::PerformanceSpan::new($name, None)
    }};
}
