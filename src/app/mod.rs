//! Main application modules.
//!
//! This module provides URL normalization and the progress lines printed by
//! the resolver while a batch runs.

pub mod progress;
pub mod url;

// Re-export public API
pub use progress::{report_result, report_retry, ProgressOptions};
pub use url::normalize_url;
