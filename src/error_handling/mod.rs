//! Error handling and classification.
//!
//! This module provides:
//! - The per-URL failure taxonomy (`Failure`)
//! - Transport, proxy login, credential and batch-level error types
//! - Status-code and transport-error classification
//! - Retry strategy configuration
//!
//! Transport failures are split into two channels: transient ones go back to
//! the retry loop, everything else becomes a terminal `Failure`.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{
    categorize_reqwest_error, classify_status, classify_transport_error, get_retry_strategy,
};
pub use types::{
    CredentialError, Failure, InitializationError, ProxyLoginError, TransportError, UrlupError,
};
