//! HTTP transport abstraction.
//!
//! The resolver and the proxy authenticator only need one operation: send a
//! request and get back the terminal status, the URL the redirect chain ended
//! at, the cookies the server set, and the redirect history. Network-level
//! failures come back as [`TransportError`].

mod http;
#[cfg(test)]
pub(crate) mod scripted;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::NETWORK_TIMEOUT_SECS;
use crate::error_handling::TransportError;

pub use http::HttpTransport;

/// Cookie name to value.
pub type CookieMap = BTreeMap<String, String>;

/// Request methods the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Resolve a URL
    Get,
    /// Submit the proxy login form
    Post,
}

/// A request to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// GET or POST
    pub method: Method,
    /// Where to send the request
    pub url: String,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Cookies sent as a `Cookie` header
    pub cookies: CookieMap,
    /// Form fields, sent url-encoded with POST requests
    pub form: Vec<(String, String)>,
    /// Follow 3xx responses that carry a `Location` header
    pub follow_redirects: bool,
    /// Timeout for each request in the chain
    pub timeout: Duration,
}

impl TransportRequest {
    /// A GET request that follows redirects.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: BTreeMap::new(),
            cookies: CookieMap::new(),
            form: Vec::new(),
            follow_redirects: true,
            timeout: Duration::from_secs(NETWORK_TIMEOUT_SECS),
        }
    }

    /// A form POST that does not follow redirects.
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            form,
            follow_redirects: false,
            ..Self::get(url)
        }
    }

    /// Replaces the request headers.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the cookies sent with the request.
    pub fn with_cookies(mut self, cookies: CookieMap) -> Self {
        self.cookies = cookies;
        self
    }

    /// Sets the timeout for each request in the chain.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One response in a redirect chain that was followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// URL that answered with a redirect
    pub url: String,
    /// Its redirect status
    pub status: u16,
}

/// The terminal response of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Status of the last response in the chain
    pub status: u16,
    /// URL of the last response in the chain
    pub final_url: String,
    /// Cookies set by any response in the chain
    pub cookies: CookieMap,
    /// Redirect responses that were followed, in order
    pub history: Vec<RedirectHop>,
}

impl TransportResponse {
    /// Status of the first response, i.e. the one for the requested URL.
    pub fn first_status(&self) -> u16 {
        self.history
            .first()
            .map(|hop| hop.status)
            .unwrap_or(self.status)
    }
}

/// Sends HTTP requests.
///
/// Implementations must be safe to share across concurrently resolved URLs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`, following redirects if it asks for that.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was obtained (timeout,
    /// DNS failure, refused or reset connection, unusable target).
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_status_without_history() {
        let response = TransportResponse {
            status: 200,
            final_url: "http://a.org".to_string(),
            cookies: CookieMap::new(),
            history: Vec::new(),
        };
        assert_eq!(response.first_status(), 200);
    }

    #[test]
    fn test_first_status_with_history() {
        let response = TransportResponse {
            status: 200,
            final_url: "http://c.org".to_string(),
            cookies: CookieMap::new(),
            history: vec![
                RedirectHop {
                    url: "http://a.org".to_string(),
                    status: 301,
                },
                RedirectHop {
                    url: "http://b.org".to_string(),
                    status: 302,
                },
            ],
        };
        assert_eq!(response.first_status(), 301);
    }

    #[test]
    fn test_post_form_does_not_follow_redirects() {
        let request = TransportRequest::post_form(
            "https://proxy.example.edu/login",
            vec![("user".to_string(), "u".to_string())],
        );
        assert_eq!(request.method, Method::Post);
        assert!(!request.follow_redirects);
        assert_eq!(request.timeout, Duration::from_secs(NETWORK_TIMEOUT_SECS));
    }
}
