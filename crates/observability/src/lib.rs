//! Tracing/logging setup shared by everything that hosts the catalog.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Like [`init`], but with an explicit default filter (e.g. `"warn"` in tests).
pub fn init_with_default(filter: &str) {
    tracing::init_with_default(filter);
}
