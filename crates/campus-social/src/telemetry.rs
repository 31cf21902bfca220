//! Tracing setup and error reporting.

use tracing_subscriber::EnvFilter;

use crate::error::{ErrorCategory, SocialError};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,campus_social=debug";

/// Install a global fmt subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .try_init();
}

/// Record a failure of `operation`.  Unknown failures are errors; the
/// user-actionable categories are logged as warnings.
pub fn report(operation: &str, err: &SocialError) {
    let category = err.category();
    match category {
        ErrorCategory::Unknown => {
            tracing::error!(operation, category = category.as_str(), error = %err, "operation failed");
        }
        _ => {
            tracing::warn!(operation, category = category.as_str(), error = %err, "operation failed");
        }
    }
}
