//! URL resolution engine.
//!
//! For each input URL the resolver normalizes it, routes it through the proxy
//! when needed, sends it, follows redirects, and classifies the outcome into a
//! [`UrlResult`]. Transient network failures are retried with exponential
//! backoff; everything else is final on the first attempt.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::app::{normalize_url, report_result, report_retry, ProgressOptions};
use crate::config::{
    Config, ACCEPTED_PAUSE, DEFAULT_CONCURRENCY, MAX_ACCEPTED_POLLS, NETWORK_TIMEOUT_SECS,
    RETRY_INITIAL_DELAY_SECS, RETRY_MAX_ATTEMPTS,
};
use crate::error_handling::{
    classify_status, classify_transport_error, get_retry_strategy, Failure, TransportError,
    UrlupError,
};
use crate::models::UrlResult;
use crate::proxy::{distinct_proxy_hosts, ProxyAuthenticator};
use crate::transport::{CookieMap, Transport, TransportRequest, TransportResponse};


/// Settings for a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Attempts per URL for transient network failures
    pub max_attempts: usize,
    /// Delay before the first retry; doubles for each following one
    pub initial_backoff: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Pause before asking again after a 202 response
    pub accepted_pause: Duration,
    /// How many times a 202 response is followed up before giving up
    pub max_accepted_polls: usize,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Cookies sent with every request
    pub cookies: CookieMap,
    /// URLs resolved at the same time in a batch
    pub concurrency: usize,
    /// Progress line settings
    pub progress: ProgressOptions,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(RETRY_INITIAL_DELAY_SECS),
            request_timeout: Duration::from_secs(NETWORK_TIMEOUT_SECS),
            accepted_pause: ACCEPTED_PAUSE,
            max_accepted_polls: MAX_ACCEPTED_POLLS,
            headers: BTreeMap::new(),
            cookies: CookieMap::new(),
            concurrency: DEFAULT_CONCURRENCY,
            progress: ProgressOptions::default(),
        }
    }
}

impl From<&Config> for ResolverConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            request_timeout: Duration::from_secs(config.timeout_seconds),
            headers: config.headers.clone(),
            cookies: config.cookies.clone(),
            concurrency: config.concurrency.max(1),
            progress: ProgressOptions {
                quiet: config.quiet,
                explain: config.explain,
                colorize: config.colorize,
            },
            ..Self::default()
        }
    }
}

/// Results of a batch, possibly cut short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One result per non-blank input, in input order
    pub results: Vec<UrlResult>,
    /// True if the batch stopped before every input was resolved
    pub interrupted: bool,
}

/// Where a single attempt ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolution {
    final_url: String,
    status: u16,
}

/// Why a single attempt did not produce a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptError {
    /// Worth trying again after a pause
    Transient(TransportError),
    /// Final
    Classified {
        failure: Failure,
        status: Option<u16>,
    },
}

impl AttemptError {
    fn classified(failure: Failure, status: Option<u16>) -> Self {
        Self::Classified { failure, status }
    }
}

/// Resolves URLs to their final destinations.
pub struct Resolver {
    transport: Arc<dyn Transport>,
    authenticator: Arc<ProxyAuthenticator>,
    config: ResolverConfig,
}

impl Resolver {
    /// Creates a resolver sending requests through `transport`.
    pub fn new(
        transport: Arc<dyn Transport>,
        authenticator: Arc<ProxyAuthenticator>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            transport,
            authenticator,
            config,
        }
    }

    /// Resolves one URL and prints its progress line.
    ///
    /// Returns `None` for blank input. Otherwise the result's `original` is
    /// the trimmed input.
    pub async fn resolve(&self, url: &str) -> Option<UrlResult> {
        let original = url.trim();
        if original.is_empty() {
            return None;
        }
        let result = self.resolve_trimmed(original).await;
        report_result(&result, &self.config.progress);
        Some(result)
    }

    async fn resolve_trimmed(&self, original: &str) -> UrlResult {
        let url = match normalize_url(original) {
            Ok(url) => url,
            Err(failure) => {
                debug!("Rejected {original}: {failure}");
                return UrlResult::failed(original, &failure, None);
            }
        };

        let mut delays = get_retry_strategy(self.config.initial_backoff, self.config.max_attempts);
        loop {
            match self.attempt(&url).await {
                Ok(resolution) => {
                    return UrlResult::resolved(original, resolution.final_url, resolution.status)
                }
                Err(AttemptError::Classified { failure, status }) => {
                    return UrlResult::failed(original, &failure, status)
                }
                Err(AttemptError::Transient(error)) => match delays.next() {
                    Some(delay) => {
                        debug!("Transient failure for {url}: {error}; retrying in {delay:?}");
                        report_retry(&url, &error, delay, &self.config.progress);
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        info!("Giving up on {} after {} attempts", url, self.config.max_attempts);
                        return UrlResult::failed(
                            original,
                            &Failure::TransportExhausted(error.to_string()),
                            None,
                        );
                    }
                },
            }
        }
    }

    /// One attempt: dispatch, then follow up on 202 responses, then classify.
    async fn attempt(&self, url: &str) -> Result<Resolution, AttemptError> {
        let response = self.dispatch(url).await?;
        let status = response.first_status();
        let mut terminal = response;

        let mut polls = 0;
        while terminal.status == 202 {
            if polls == self.config.max_accepted_polls {
                debug!("{url} still answers 202 after {polls} follow-ups");
                return Err(AttemptError::classified(Failure::Unresolved, Some(status)));
            }
            polls += 1;
            tokio::time::sleep(self.config.accepted_pause).await;
            terminal = self.dispatch(url).await?;
        }

        match classify_status(terminal.status) {
            None => Ok(Resolution {
                final_url: terminal.final_url,
                status,
            }),
            Some(failure) => Err(AttemptError::classified(failure, Some(status))),
        }
    }

    /// Sends `url`, through the proxy session if it is proxy-routed.
    async fn dispatch(&self, url: &str) -> Result<TransportResponse, AttemptError> {
        let via_proxy = self.authenticator.url_uses_proxy(url);
        let mut cookies = self.config.cookies.clone();
        let target = if via_proxy {
            let session_cookies = self
                .authenticator
                .cookies_for(url)
                .await
                .map_err(|e| AttemptError::classified(Failure::ProxyLogin(e.to_string()), None))?;
            cookies.extend(session_cookies);
            self.authenticator
                .convention()
                .inner_url(url)
                .unwrap_or_else(|| url.to_string())
        } else {
            url.to_string()
        };

        let request = TransportRequest::get(target)
            .with_headers(self.config.headers.clone())
            .with_cookies(cookies)
            .with_timeout(self.config.request_timeout);

        self.transport.send(&request).await.map_err(|error| {
            match classify_transport_error(&error, via_proxy) {
                Some(failure) => AttemptError::classified(failure, None),
                None => AttemptError::Transient(error),
            }
        })
    }

    /// Fails if the batch names more than one proxy host.
    ///
    /// Hosts are read from the normalized URLs, the same way requests are
    /// routed. Entries that fail normalization are skipped since they end up
    /// as per-URL failures. Two hosts differing only by scheme count once.
    ///
    /// # Errors
    ///
    /// Returns [`UrlupError::MultipleProxies`] listing the hosts, sorted.
    pub fn check_single_proxy<S: AsRef<str>>(&self, urls: &[S]) -> Result<(), UrlupError> {
        let normalized: Vec<String> = urls
            .iter()
            .filter_map(|url| normalize_url(url.as_ref().trim()).ok())
            .collect();
        let hosts = distinct_proxy_hosts(
            self.authenticator.convention(),
            normalized.iter().map(String::as_str),
        );
        let authorities: BTreeSet<&str> = hosts
            .iter()
            .map(|host| host.split_once("://").map_or(host.as_str(), |(_, rest)| rest))
            .collect();
        if authorities.len() > 1 {
            return Err(UrlupError::MultipleProxies {
                hosts: hosts.into_iter().collect(),
            });
        }
        Ok(())
    }

    /// Resolves every URL, in input order. Blank entries produce no result.
    ///
    /// # Errors
    ///
    /// Returns [`UrlupError::MultipleProxies`] before sending anything if the
    /// URLs go through more than one proxy host.
    pub async fn resolve_batch<S: AsRef<str>>(
        &self,
        urls: &[S],
    ) -> Result<Vec<UrlResult>, UrlupError> {
        let outcome = self
            .resolve_batch_until(urls, std::future::pending::<()>())
            .await?;
        Ok(outcome.results)
    }

    /// Like [`Resolver::resolve_batch`], but stops when `shutdown` completes
    /// and returns the results finished so far.
    pub async fn resolve_batch_until<S, F>(
        &self,
        urls: &[S],
        shutdown: F,
    ) -> Result<BatchOutcome, UrlupError>
    where
        S: AsRef<str>,
        F: Future<Output = ()>,
    {
        self.check_single_proxy(urls)?;

        let pending = stream::iter(urls.iter())
            .map(|url| self.resolve(url.as_ref()))
            .buffered(self.config.concurrency.max(1));
        tokio::pin!(pending);
        tokio::pin!(shutdown);

        let mut outcome = BatchOutcome::default();
        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some(Some(result)) => outcome.results.push(result),
                    Some(None) => {}
                    None => break,
                },
                _ = &mut shutdown => {
                    warn!("Interrupted after {} results", outcome.results.len());
                    outcome.interrupted = true;
                    break;
                }
            }
        }
        Ok(outcome)
    }
}
