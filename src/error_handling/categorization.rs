//! Error categorization and retry strategy.
//!
//! This module maps HTTP status codes and network failures onto the
//! [`Failure`] taxonomy and configures the retry backoff.

use std::error::Error as StdError;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

use super::types::{Failure, TransportError};
use crate::config::RETRY_FACTOR;

/// Creates the exponential backoff schedule used between attempts.
///
/// The first delay is `initial`, and each following delay is `RETRY_FACTOR`
/// times the previous one: with the defaults that is 2s, 4s, 8s, ...
/// The iterator yields `max_attempts - 1` delays, one before each retry.
pub fn get_retry_strategy(
    initial: Duration,
    max_attempts: usize,
) -> impl Iterator<Item = Duration> {
    // ExponentialBackoff yields factor * base^n for n = 1, 2, ...
    let factor = (initial.as_millis() as u64 / RETRY_FACTOR).max(1);
    ExponentialBackoff::from_millis(RETRY_FACTOR)
        .factor(factor)
        .take(max_attempts.saturating_sub(1))
}

/// Classifies a terminal HTTP status code.
///
/// Returns `None` for codes in `[200, 400)`, which lead to a destination.
/// Code 202 is also in that range; callers poll again before classifying it.
pub fn classify_status(code: u16) -> Option<Failure> {
    match code {
        200..=399 => None,
        401 | 402 | 403 | 407 | 451 | 511 => Some(Failure::AuthRequired),
        404 | 410 => Some(Failure::NotFound),
        405 | 406 | 409 | 411 | 412 | 414 | 417 | 428 | 431 | 505 | 510 => {
            Some(Failure::ServerProtocolViolation(code))
        }
        415 | 416 => Some(Failure::RequestRejected),
        429 => Some(Failure::RateLimited),
        503 => Some(Failure::ServiceUnavailable),
        500 | 501 | 502 | 506 | 507 | 508 => Some(Failure::InternalServerError(code)),
        _ => Some(Failure::Unresolved),
    }
}

/// Classifies a transport failure that should not be retried.
///
/// Returns `None` for transient failures, which go back to the retry loop.
pub fn classify_transport_error(error: &TransportError, via_proxy: bool) -> Option<Failure> {
    if error.is_transient() {
        return None;
    }
    let failure = match error {
        TransportError::ConnectTimeout(_) => Failure::ConnectTimeout,
        TransportError::Dns(_) => Failure::DnsUnresolved { via_proxy },
        TransportError::BadPort(_) => Failure::BadPort,
        TransportError::UnsupportedScheme(_) => Failure::UnsupportedScheme,
        TransportError::InvalidTarget(_) => Failure::MalformedUrl,
        TransportError::TooManyRedirects(_)
        | TransportError::Timeout(_)
        | TransportError::Connect(_)
        | TransportError::Other(_) => Failure::Unresolved,
    };
    Some(failure)
}

/// Categorizes a `reqwest::Error` into a [`TransportError`].
///
/// Connect timeouts are reported by reqwest as errors that are both
/// `is_connect()` and `is_timeout()`. DNS failures surface as connect errors
/// whose source chain mentions the lookup.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> TransportError {
    let detail = error_chain_message(error);
    let lowered = detail.to_lowercase();

    if error.is_connect() && error.is_timeout() {
        TransportError::ConnectTimeout(detail)
    } else if error.is_connect() && is_dns_failure(&lowered) {
        TransportError::Dns(detail)
    } else if error.is_connect() {
        TransportError::Connect(detail)
    } else if error.is_timeout() {
        TransportError::Timeout(detail)
    } else if error.is_builder() {
        if lowered.contains("invalid port") {
            TransportError::BadPort(detail)
        } else if lowered.contains("scheme") {
            TransportError::UnsupportedScheme(detail)
        } else {
            TransportError::InvalidTarget(detail)
        }
    } else if error.is_redirect() {
        TransportError::InvalidTarget(detail)
    } else {
        TransportError::Other(detail)
    }
}

fn is_dns_failure(message: &str) -> bool {
    message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("name or service not known")
        || message.contains("no such host")
        || message.contains("nodename nor servname")
}

/// Joins an error and all of its sources into one line.
fn error_chain_message(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
