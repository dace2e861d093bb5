//! Configuration constants.
//!
//! This module defines the timeouts, retry budget, and other operational
//! parameters used by the resolver and the proxy authenticator.

use std::time::Duration;

// Network operation timeouts
/// Per-attempt request timeout in seconds (whole request, including redirects)
pub const NETWORK_TIMEOUT_SECS: u64 = 15;
/// TCP connection timeout in seconds
/// A connect timeout is reported immediately and never retried
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent string for HTTP requests.
///
/// Some servers answer differently (or not at all) to clients that do not
/// look like a browser, which would distort the reported destination.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Retry strategy
/// Delay in seconds before the first retry of a transient transport failure
pub const RETRY_INITIAL_DELAY_SECS: u64 = 2;
/// Factor by which the retry delay is multiplied after each failure
pub const RETRY_FACTOR: u64 = 2;
/// Maximum number of attempts per URL (including the initial attempt)
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// 202 Accepted handling
/// Pause before asking again after a 202 response
pub const ACCEPTED_PAUSE: Duration = Duration::from_secs(1);
/// Maximum number of follow-up requests after consecutive 202 responses
pub const MAX_ACCEPTED_POLLS: usize = 5;

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;

// Proxy login
/// Maximum number of login attempts when the proxy login times out
pub const LOGIN_MAX_ATTEMPTS: usize = 3;
/// Path appended to the proxy host to form the login target
pub const PROXY_LOGIN_PATH: &str = "/login";

// Credential storage
/// Keychain service under which proxy credentials are saved
pub const KEYRING_SERVICE: &str = "org.caltechlibrary.urlup";
/// Label used when prompting for proxy credentials
pub const PROXY_PROMPT_LABEL: &str = "Proxy login";

// Concurrency
/// Default number of URLs resolved at the same time (sequential)
pub const DEFAULT_CONCURRENCY: usize = 1;
