//! Tracing/logging initialization for catalog hosts.
//!
//! Repository writes and queries run inside `#[instrument]` spans that carry
//! `operation`, `product_id` and `row_count`. Each JSON event carries the
//! current span's fields under `span` (the parent chain is left out), so a
//! failed insert logs as one line naming the operation.
//!
//! The filter comes from `RUST_LOG` when set, e.g.
//! `RUST_LOG=catalog_infra=debug` to see deletes of absent rows.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Initialize with `default_filter` used when `RUST_LOG` is unset or invalid.
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
