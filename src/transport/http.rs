//! reqwest-backed transport.
//!
//! The client is built with redirects disabled and the chain is followed here,
//! so the status of every hop is kept.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{COOKIE, LOCATION};
use reqwest::Url;

use super::{CookieMap, Method, RedirectHop, Transport, TransportRequest, TransportResponse};
use crate::config::MAX_REDIRECT_HOPS;
use crate::error_handling::{categorize_reqwest_error, TransportError};

/// Sends requests with a shared `reqwest::Client`.
///
/// The client must have redirects disabled (see
/// [`init_client`](crate::initialization::init_client)).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_hops: usize,
}

impl HttpTransport {
    /// Wraps `client`, following at most `MAX_REDIRECT_HOPS` redirects per request.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_hops: MAX_REDIRECT_HOPS,
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        request: &TransportRequest,
        cookies: &CookieMap,
    ) -> Result<reqwest::Response, TransportError> {
        let mut builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        builder = builder.timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !cookies.is_empty() {
            builder = builder.header(COOKIE, cookie_header(cookies));
        }
        if method == Method::Post && !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        builder
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))
    }
}

/// Renders cookies as a `Cookie` request header value.
fn cookie_header(cookies: &CookieMap) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut method = request.method;
        let mut current = request.url.clone();
        let mut cookies = request.cookies.clone();
        let mut received = CookieMap::new();
        let mut history: Vec<RedirectHop> = Vec::new();

        loop {
            let response = self.send_once(method, &current, request, &cookies).await?;
            let status = response.status().as_u16();
            debug!("{} {} -> {}", method_name(method), current, status);

            for cookie in response.cookies() {
                received.insert(cookie.name().to_string(), cookie.value().to_string());
                cookies.insert(cookie.name().to_string(), cookie.value().to_string());
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            match location {
                Some(location) if request.follow_redirects && is_redirect(status) => {
                    if history.len() >= self.max_hops {
                        return Err(TransportError::TooManyRedirects(self.max_hops));
                    }
                    let next = Url::parse(&current)
                        .and_then(|base| base.join(&location))
                        .map_err(|e| {
                            TransportError::InvalidTarget(format!("{location}: {e}"))
                        })?;
                    history.push(RedirectHop {
                        url: current,
                        status,
                    });
                    // Browsers switch to GET after these
                    if status == 303 || (method == Method::Post && matches!(status, 301 | 302)) {
                        method = Method::Get;
                    }
                    current = next.to_string();
                }
                None if request.follow_redirects && is_redirect(status) => {
                    warn!("Redirect status {status} for {current} but no Location header");
                    return Ok(TransportResponse {
                        status,
                        final_url: current,
                        cookies: received,
                        history,
                    });
                }
                _ => {
                    return Ok(TransportResponse {
                        status,
                        final_url: current,
                        cookies: received,
                        history,
                    });
                }
            }
        }
    }
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
    }
}
