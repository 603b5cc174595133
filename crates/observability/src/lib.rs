//! Tracing and logging (shared setup).

pub use crate::tracing::{LogFormat, UnknownLogFormat, new_request_id};

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, layers, correlation ids).
pub mod tracing;
