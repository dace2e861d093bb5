//! Configuration types.
//!
//! This module defines the library configuration and the enums shared with the
//! command-line front end.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_CONCURRENCY, NETWORK_TIMEOUT_SECS, RETRY_MAX_ATTEMPTS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use urlup::Config;
///
/// let config = Config {
///     urls: vec!["http://caltech.edu".to_string()],
///     quiet: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// File to read URLs from (one per line); takes precedence over `urls`
    pub input: Option<PathBuf>,

    /// URLs given directly
    pub urls: Vec<String>,

    /// CSV file to write results to
    pub output: Option<PathBuf>,

    /// Suppress per-URL progress lines
    pub quiet: bool,

    /// Explain the meaning of each status code in progress lines
    pub explain: bool,

    /// Color-code progress lines
    pub colorize: bool,

    /// Proxy login user name
    pub proxy_user: Option<String>,

    /// Proxy login password
    pub proxy_password: Option<String>,

    /// Read and save proxy credentials in the OS keychain
    pub use_keyring: bool,

    /// Ignore saved proxy credentials and ask again
    pub reset_keyring: bool,

    /// Cookies sent with every request
    pub cookies: BTreeMap<String, String>,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Maximum attempts per URL for transient network failures
    pub max_attempts: usize,

    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,

    /// Number of URLs resolved at the same time
    pub concurrency: usize,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            urls: Vec::new(),
            output: None,
            quiet: false,
            explain: false,
            colorize: true,
            proxy_user: None,
            proxy_password: None,
            use_keyring: true,
            reset_keyring: false,
            cookies: BTreeMap::new(),
            headers: BTreeMap::new(),
            max_attempts: RETRY_MAX_ATTEMPTS,
            timeout_seconds: NETWORK_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            log_level: LogLevel::Warn,
            log_format: LogFormat::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.timeout_seconds, 15);
        assert_eq!(config.concurrency, 1);
        assert!(config.use_keyring);
        assert!(!config.reset_keyring);
        assert!(!config.quiet);
        assert!(config.cookies.is_empty());
        assert!(config.input.is_none());
    }
}
