//! Proxy login and session cache.
//!
//! One login sequence runs per proxy host for the lifetime of the
//! authenticator; its outcome (session or error) is cached and shared by every
//! URL routed through that host, even when URLs are resolved concurrently.
//! Sessions are never refreshed: an expired session shows up as failing
//! requests, not as a new login.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use super::convention::ProxyConvention;
use crate::config::{LOGIN_MAX_ATTEMPTS, NETWORK_TIMEOUT_SECS, RETRY_INITIAL_DELAY_SECS};
use crate::credentials::{CredentialResolver, Credentials};
use crate::error_handling::{get_retry_strategy, ProxyLoginError, TransportError};
use crate::transport::{CookieMap, Transport, TransportRequest};

/// An authenticated session with one proxy host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySession {
    /// Scheme and authority of the proxy
    pub host: String,
    /// Cookies issued by the login
    pub cookies: CookieMap,
}

type LoginOutcome = Result<ProxySession, ProxyLoginError>;

/// Timeouts and retry budget for the login request.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    /// Timeout of each login request
    pub timeout: Duration,
    /// Attempts before a timing-out login is given up
    pub max_attempts: usize,
    /// Delay before the first retry; doubles for each following one
    pub initial_backoff: Duration,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(NETWORK_TIMEOUT_SECS),
            max_attempts: LOGIN_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(RETRY_INITIAL_DELAY_SECS),
        }
    }
}

/// Logs in to the proxy and hands out session cookies.
pub struct ProxyAuthenticator {
    transport: Arc<dyn Transport>,
    convention: Arc<dyn ProxyConvention>,
    credential_resolver: CredentialResolver,
    credentials: tokio::sync::Mutex<Option<Credentials>>,
    sessions: Mutex<HashMap<String, Arc<OnceCell<LoginOutcome>>>>,
    settings: LoginSettings,
}

impl ProxyAuthenticator {
    /// Creates an authenticator that logs in through `transport` with the
    /// credentials from `credential_resolver`.
    pub fn new(
        transport: Arc<dyn Transport>,
        convention: Arc<dyn ProxyConvention>,
        credential_resolver: CredentialResolver,
    ) -> Self {
        Self {
            transport,
            convention,
            credential_resolver,
            credentials: tokio::sync::Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
            settings: LoginSettings::default(),
        }
    }

    /// Replaces the login timeout and retry settings.
    pub fn with_settings(mut self, settings: LoginSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The URL convention this authenticator works with.
    pub fn convention(&self) -> &dyn ProxyConvention {
        self.convention.as_ref()
    }

    /// Returns true if `url` goes through the proxy.
    pub fn url_uses_proxy(&self, url: &str) -> bool {
        self.convention.uses_proxy(url)
    }

    /// Logs in to the proxy that `url` goes through, unless that already
    /// happened, and returns the session.
    ///
    /// # Errors
    ///
    /// Returns the (cached) [`ProxyLoginError`] if the login failed.
    pub async fn authenticate(&self, url: &str) -> Result<ProxySession, ProxyLoginError> {
        let host = self.convention.proxy_host(url);
        let cell = {
            let mut sessions = self
                .sessions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(sessions.entry(host.clone()).or_default())
        };
        cell.get_or_init(|| self.login(host)).await.clone()
    }

    /// Cookies to send with `url`: empty if it does not use the proxy,
    /// otherwise the proxy session's cookies.
    pub async fn cookies_for(&self, url: &str) -> Result<CookieMap, ProxyLoginError> {
        if !self.url_uses_proxy(url) {
            return Ok(CookieMap::new());
        }
        Ok(self.authenticate(url).await?.cookies)
    }

    /// The cached session for `host`, if a login to it succeeded.
    pub fn session(&self, host: &str) -> Option<ProxySession> {
        let sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .get(host)
            .and_then(|cell| cell.get())
            .and_then(|outcome| outcome.as_ref().ok())
            .cloned()
    }

    /// Resolves credentials once; later calls reuse them.
    async fn credentials(&self) -> Result<Credentials, ProxyLoginError> {
        let mut cached = self.credentials.lock().await;
        if let Some(credentials) = cached.as_ref() {
            return Ok(credentials.clone());
        }
        // Keychain access and prompting block
        let resolver = self.credential_resolver.clone();
        let credentials = tokio::task::spawn_blocking(move || resolver.resolve())
            .await
            .map_err(|e| ProxyLoginError::Credentials(e.to_string()))?
            .map_err(|e| ProxyLoginError::Credentials(e.to_string()))?;
        *cached = Some(credentials.clone());
        Ok(credentials)
    }

    async fn login(&self, host: String) -> LoginOutcome {
        let credentials = self.credentials().await?;
        let login_url = self.convention.login_url(&host);
        if url::Url::parse(&login_url).is_err() {
            return Err(ProxyLoginError::MalformedTarget(login_url));
        }
        debug!("Logging in to proxy {} as {}", host, credentials.user);

        let request = TransportRequest::post_form(
            login_url,
            vec![
                ("user".to_string(), credentials.user),
                ("pass".to_string(), credentials.password),
            ],
        )
        .with_timeout(self.settings.timeout);

        let mut delays =
            get_retry_strategy(self.settings.initial_backoff, self.settings.max_attempts);
        let mut attempts = 0;
        let response = loop {
            attempts += 1;
            match self.transport.send(&request).await {
                Ok(response) => break response,
                Err(e @ (TransportError::ConnectTimeout(_) | TransportError::Timeout(_))) => {
                    match delays.next() {
                        Some(delay) => {
                            warn!(
                                "Proxy login to {} timed out ({}); retrying in {}s",
                                host,
                                e,
                                delay.as_secs_f64()
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(ProxyLoginError::Timeout { attempts }),
                    }
                }
                Err(
                    e @ (TransportError::BadPort(_)
                    | TransportError::UnsupportedScheme(_)
                    | TransportError::InvalidTarget(_)),
                ) => return Err(ProxyLoginError::MalformedTarget(e.to_string())),
                Err(e) => return Err(ProxyLoginError::Network(e.to_string())),
            }
        };

        if !(200..400).contains(&response.status) {
            warn!("Proxy {} answered the login with {}", host, response.status);
            return Err(ProxyLoginError::Rejected(response.status));
        }
        if response.cookies.is_empty() {
            return Err(ProxyLoginError::LoginIncorrect);
        }
        info!("Logged in to proxy {host}");
        Ok(ProxySession {
            host,
            cookies: response.cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, NoCredentialStore, Prompter};
    use crate::error_handling::CredentialError;
    use crate::proxy::EzProxyConvention;
    use crate::transport::scripted::{respond, respond_with_cookies, ScriptedTransport};
    use crate::transport::Method;

    const PROXIED: &str = "https://proxy.lib.example.edu/login?url=https://doi.org/10.1/x";
    const LOGIN: &str = "https://proxy.lib.example.edu/login";

    struct NoPrompter;

    impl Prompter for NoPrompter {
        fn ask(&self, prompt: &str, _secret: bool) -> Result<String, CredentialError> {
            panic!("unexpected prompt: {prompt}")
        }
    }

    fn authenticator(transport: Arc<ScriptedTransport>) -> ProxyAuthenticator {
        let store: Arc<dyn CredentialStore> = Arc::new(NoCredentialStore);
        let resolver = CredentialResolver::new("test", "Proxy login", store, Arc::new(NoPrompter))
            .with_supplied(Some("alice".into()), Some("secret".into()));
        ProxyAuthenticator::new(transport, Arc::new(EzProxyConvention), resolver)
    }

    #[tokio::test]
    async fn test_non_proxy_url_gets_no_cookies() {
        let transport = Arc::new(ScriptedTransport::new());
        let auth = authenticator(transport.clone());
        let cookies = auth.cookies_for("https://doi.org/10.1/x").await.unwrap();
        assert!(cookies.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_login_posts_credentials_and_caches_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, respond_with_cookies(302, LOGIN, &[("ezproxy", "abc")]));
        let auth = authenticator(transport.clone());

        let cookies = auth.cookies_for(PROXIED).await.unwrap();
        assert_eq!(cookies.get("ezproxy").map(String::as_str), Some("abc"));
        // Second use comes from the cache
        auth.cookies_for(PROXIED).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Post);
        assert!(!calls[0].follow_redirects);
        assert_eq!(
            calls[0].form,
            vec![
                ("user".to_string(), "alice".to_string()),
                ("pass".to_string(), "secret".to_string())
            ]
        );
        assert_eq!(
            auth.session("https://proxy.lib.example.edu").map(|s| s.cookies),
            Some(cookies)
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_use_logs_in_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, respond_with_cookies(200, LOGIN, &[("ezproxy", "abc")]));
        let auth = authenticator(transport.clone());

        let (a, b) = tokio::join!(auth.authenticate(PROXIED), auth.authenticate(PROXIED));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_cookie_set_is_login_incorrect() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, respond(200, LOGIN));
        let auth = authenticator(transport.clone());

        assert_eq!(
            auth.authenticate(PROXIED).await,
            Err(ProxyLoginError::LoginIncorrect)
        );
        // The failure is cached too
        assert_eq!(
            auth.authenticate(PROXIED).await,
            Err(ProxyLoginError::LoginIncorrect)
        );
        assert_eq!(transport.call_count(), 1);
        assert!(auth.session("https://proxy.lib.example.edu").is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, respond_with_cookies(500, LOGIN, &[("ezproxy", "abc")]));
        let auth = authenticator(transport);
        assert_eq!(
            auth.authenticate(PROXIED).await,
            Err(ProxyLoginError::Rejected(500))
        );
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, Err(TransportError::Dns("no such host".into())));
        let auth = authenticator(transport.clone());
        assert!(matches!(
            auth.authenticate(PROXIED).await,
            Err(ProxyLoginError::Network(_))
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried_with_backoff() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(LOGIN, Err(TransportError::Timeout("slow".into())));
        let auth = authenticator(transport.clone());

        let start = tokio::time::Instant::now();
        assert_eq!(
            auth.authenticate(PROXIED).await,
            Err(ProxyLoginError::Timeout { attempts: 3 })
        );
        assert_eq!(transport.call_count(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on(LOGIN, Err(TransportError::ConnectTimeout("slow".into())))
            .on(LOGIN, respond_with_cookies(302, LOGIN, &[("ezproxy", "abc")]));
        let auth = authenticator(transport.clone());
        assert!(auth.authenticate(PROXIED).await.is_ok());
        assert_eq!(transport.call_count(), 2);
    }
}
