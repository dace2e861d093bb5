//! urlup library: find where URLs end up after redirection
//!
//! Each input URL is normalized, sent, and followed through its redirects;
//! the outcome is classified by status code into a [`UrlResult`]. Transient
//! network failures are retried with exponential backoff. URLs routed through
//! an institutional proxy (EZproxy-style `.../login?url=...` addresses) are
//! resolved with a proxy session obtained by logging in once per run.
//!
//! # Example
//!
//! ```no_run
//! use urlup::{run_batch, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     urls: vec!["caltech.edu".to_string(), "https://doi.org/10.1000/182".to_string()],
//!     ..Default::default()
//! };
//!
//! let report = run_batch(config).await?;
//! for result in &report.results {
//!     println!("{} -> {:?}", result.original, result.final_url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod app;
pub mod config;
pub mod credentials;
mod error_handling;
pub mod export;
pub mod initialization;
mod models;
pub mod proxy;
pub mod resolver;
pub mod transport;

// Re-export public API
pub use app::{normalize_url, ProgressOptions};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{
    CredentialError, Failure, InitializationError, ProxyLoginError, TransportError, UrlupError,
};
pub use models::UrlResult;
pub use resolver::{BatchOutcome, Resolver, ResolverConfig};
pub use run::{run_batch, run_batch_until, BatchReport};

// Internal run module (wires the collaborators together for a batch)
mod run {
    use std::future::Future;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use log::{debug, info, warn};

    use crate::config::{Config, KEYRING_SERVICE, PROXY_PROMPT_LABEL};
    use crate::credentials::{
        CredentialResolver, CredentialStore, KeyringCredentialStore, NoCredentialStore,
        TerminalPrompter,
    };
    use crate::export::write_csv;
    use crate::initialization::init_client;
    use crate::models::UrlResult;
    use crate::proxy::{EzProxyConvention, LoginSettings, ProxyAuthenticator};
    use crate::resolver::{Resolver, ResolverConfig};
    use crate::transport::{HttpTransport, Transport};

    /// Results of a batch run.
    #[derive(Debug, Clone)]
    pub struct BatchReport {
        /// One result per non-blank input URL, in input order
        pub results: Vec<UrlResult>,
        /// Number of URLs resolved (or rejected)
        pub total: usize,
        /// Number of URLs that led to a destination
        pub succeeded: usize,
        /// Number of URLs that could not be resolved
        pub failed: usize,
        /// True if the run was stopped before every URL was resolved
        pub interrupted: bool,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    impl BatchReport {
        fn new(results: Vec<UrlResult>, interrupted: bool, elapsed: Duration) -> Self {
            let succeeded = results.iter().filter(|r| r.is_success()).count();
            Self {
                total: results.len(),
                succeeded,
                failed: results.len() - succeeded,
                results,
                interrupted,
                elapsed_seconds: elapsed.as_secs_f64(),
            }
        }
    }

    /// Resolves every URL named by `config` and writes the CSV output, if any.
    ///
    /// URLs come from `config.input` when it is set (one per line; blank lines
    /// and lines starting with `#` are skipped), otherwise from `config.urls`.
    /// Ctrl-C stops the run; the results finished by then are still returned
    /// and written.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input file cannot be read
    /// - The HTTP client cannot be created
    /// - The URLs go through more than one proxy host
    /// - The output file cannot be written
    pub async fn run_batch(config: Config) -> Result<BatchReport> {
        run_batch_until(config, ctrl_c()).await
    }

    /// Like [`run_batch`], but stops when `shutdown` completes instead of on Ctrl-C.
    pub async fn run_batch_until<F>(config: Config, shutdown: F) -> Result<BatchReport>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let urls = match &config.input {
            Some(path) => read_url_file(path).await?,
            None => config.urls.clone(),
        };
        debug!("Resolving {} URL entries", urls.len());

        let resolver = build_resolver(&config)?;
        let outcome = resolver.resolve_batch_until(&urls, shutdown).await?;
        if outcome.interrupted {
            warn!("Run interrupted; keeping {} results", outcome.results.len());
        }

        if let Some(output) = &config.output {
            let rows = write_csv(output, &outcome.results)?;
            info!("Wrote {} results to {}", rows, output.display());
        }

        Ok(BatchReport::new(
            outcome.results,
            outcome.interrupted,
            start.elapsed(),
        ))
    }

    fn build_resolver(config: &Config) -> Result<Resolver> {
        let client =
            init_client(config.timeout_seconds).context("Failed to initialize HTTP client")?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(client));

        let store: Arc<dyn CredentialStore> = if config.use_keyring {
            Arc::new(KeyringCredentialStore::new())
        } else {
            Arc::new(NoCredentialStore)
        };
        let credentials = CredentialResolver::new(
            KEYRING_SERVICE,
            PROXY_PROMPT_LABEL,
            store,
            Arc::new(TerminalPrompter),
        )
        .with_supplied(config.proxy_user.clone(), config.proxy_password.clone())
        .persist(config.use_keyring)
        .reset(config.reset_keyring);

        let authenticator = ProxyAuthenticator::new(
            Arc::clone(&transport),
            Arc::new(EzProxyConvention),
            credentials,
        )
        .with_settings(LoginSettings {
            timeout: Duration::from_secs(config.timeout_seconds),
            ..LoginSettings::default()
        });

        Ok(Resolver::new(
            transport,
            Arc::new(authenticator),
            ResolverConfig::from(config),
        ))
    }

    /// Reads URLs from a file, one per line, skipping blanks and `#` comments.
    async fn read_url_file(path: &Path) -> Result<Vec<String>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        Ok(parse_url_lines(&text))
    }

    fn parse_url_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    async fn ctrl_c() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a signal handler the run simply cannot be interrupted
            warn!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }

}
