//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{CONNECT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for all requests.
///
/// Creates a `reqwest::Client` with:
/// - Redirects disabled, so the transport can follow them itself and keep the
///   redirect history
/// - The connect timeout from `CONNECT_TIMEOUT_SECS` and an overall request
///   timeout of `timeout_secs` (requests can still set their own)
/// - A browser-like User-Agent
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(timeout_secs: u64) -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    Ok(client)
}
