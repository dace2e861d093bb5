//! Error type definitions.
//!
//! This module defines the per-URL failure taxonomy, the transport and proxy
//! login errors that feed it, and the batch-level errors.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors that abort a whole batch before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlupError {
    /// The batch references more than one proxy host; only one proxy login is
    /// supported per run.
    #[error(
        "Only one proxy host is supported per run, found {}: {}",
        hosts.len(),
        hosts.join(", ")
    )]
    MultipleProxies {
        /// The distinct proxy hosts, sorted
        hosts: Vec<String>,
    },
}

/// Terminal classification of a URL that could not be resolved.
///
/// The `Display` text is the human-readable reason stored in
/// [`UrlResult::error`](crate::UrlResult).
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum Failure {
    /// The input could not be interpreted as a URL.
    #[error("Malformed URL")]
    MalformedUrl,

    /// The URL scheme is neither http nor https.
    #[error("Unsupported network protocol")]
    UnsupportedScheme,

    /// The port part of the URL is not a valid port number.
    #[error("Bad port")]
    BadPort,

    /// The host name could not be resolved.
    #[error("{}", dns_message(*via_proxy))]
    DnsUnresolved {
        /// Whether the request was routed through the proxy
        via_proxy: bool,
    },

    /// The TCP connection could not be established in time. Never retried.
    #[error("Timed out trying to connect")]
    ConnectTimeout,

    /// Transient transport failures persisted through the whole retry budget.
    /// Carries the description of the last failure.
    #[error("{0}")]
    TransportExhausted(String),

    /// Logging in to the proxy failed.
    #[error("{0}")]
    ProxyLogin(String),

    /// 401, 402, 403, 407, 451, 511
    #[error("Access is forbidden or requires authentication")]
    AuthRequired,

    /// 404, 410
    #[error("No content found at this location")]
    NotFound,

    /// 405, 406, 409, 411, 412, 414, 417, 428, 431, 505, 510
    #[error("Server returned code {0} -- please report this")]
    ServerProtocolViolation(u16),

    /// 415, 416
    #[error("Server rejected the request")]
    RequestRejected,

    /// 429
    #[error("Server blocking further requests due to rate limits")]
    RateLimited,

    /// 503
    #[error("Server is unavailable -- try again later")]
    ServiceUnavailable,

    /// 500, 501, 502, 506, 507, 508
    #[error("Server error (code {0})")]
    InternalServerError(u16),

    /// Any other outcome that did not lead to a destination.
    #[error("Unable to resolve URL")]
    Unresolved,
}

fn dns_message(via_proxy: bool) -> &'static str {
    if via_proxy {
        "Proxy is unable to resolve the destination host name"
    } else {
        "Cannot resolve host name"
    }
}

/// Failures raised by the network layer itself, as opposed to a classified
/// HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The TCP connect phase timed out.
    #[error("Connection timed out: {0}")]
    ConnectTimeout(String),

    /// The request timed out after the connection was established.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The host name could not be resolved.
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    /// The connection was refused, reset, or otherwise failed.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The target URL has an invalid port.
    #[error("Invalid port in {0}")]
    BadPort(String),

    /// The target URL uses a scheme the client cannot speak.
    #[error("Unsupported scheme in {0}")]
    UnsupportedScheme(String),

    /// The request could not be built for the target.
    #[error("Invalid request target: {0}")]
    InvalidTarget(String),

    /// The redirect chain exceeded the hop limit.
    #[error("Too many redirects (more than {0})")]
    TooManyRedirects(usize),

    /// Anything else reported by the client.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the failure may go away on its own and is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connect(_) | TransportError::Other(_)
        )
    }
}

/// Errors from logging in to the proxy.
///
/// Login outcomes are cached per proxy host, so these are `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyLoginError {
    /// Every login attempt timed out.
    #[error("Timed out trying to log in to the proxy after {attempts} attempts")]
    Timeout {
        /// Number of attempts made
        attempts: usize,
    },

    /// The login address derived from the URL is not usable.
    #[error("Malformed proxy login address: {0}")]
    MalformedTarget(String),

    /// The proxy could not be reached.
    #[error("Network error while contacting the proxy: {0}")]
    Network(String),

    /// The proxy answered with an unexpected status.
    #[error("Proxy error (code {0})")]
    Rejected(u16),

    /// The proxy accepted the request but did not issue a session.
    #[error("Proxy login incorrect")]
    LoginIncorrect,

    /// Credentials could not be obtained.
    #[error("Unable to obtain proxy credentials: {0}")]
    Credentials(String),
}

/// Errors from the credential store or the interactive prompt.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The keychain could not be read or written.
    #[error("Keyring error: {0}")]
    Store(String),

    /// Reading from the terminal failed.
    #[error("Prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    /// The user supplied an empty value.
    #[error("No {0} given")]
    Missing(&'static str),
}
