//! Tracing, logging, metrics (shared setup).
//!
//! The aggregation core itself only emits diagnostics (e.g. container
//! contract violations observed during extraction); hosts call [`init`]
//! once at startup to make those visible.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
