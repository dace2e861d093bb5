//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry budget, etc.)
//! - The library configuration and log option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
