//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `urlup` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - The end-of-run summary and exit status
//!
//! All core functionality is implemented in the library crate.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use urlup::initialization::init_logger_with;
use urlup::{run_batch, Config, LogFormat, LogLevel};

/// Find the ultimate destination of URLs after following redirections.
#[derive(Debug, Parser)]
#[command(name = "urlup", version, about)]
struct Cli {
    /// URLs to resolve (ignored when --input is given)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// File of URLs to resolve, one per line
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write results to this CSV file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Don't print a line for each URL
    #[arg(short, long)]
    quiet: bool,

    /// Explain the status code of each result
    #[arg(short, long)]
    explain: bool,

    /// Don't color-code the output
    #[arg(short = 'C', long)]
    no_color: bool,

    /// Proxy login user name
    #[arg(short, long)]
    user: Option<String>,

    /// Proxy login password
    #[arg(short, long)]
    password: Option<String>,

    /// Don't read or save proxy credentials in the keychain
    #[arg(short = 'N', long)]
    no_keyring: bool,

    /// Ask for proxy credentials again and replace the saved ones
    #[arg(short = 'R', long)]
    reset_keyring: bool,

    /// Cookie to send with every request (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_pair)]
    cookies: Vec<(String, String)>,

    /// Header to send with every request (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Attempts per URL for transient network failures
    #[arg(long, default_value_t = urlup::config::RETRY_MAX_ATTEMPTS)]
    max_attempts: usize,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", default_value_t = urlup::config::NETWORK_TIMEOUT_SECS)]
    timeout_seconds: u64,

    /// Number of URLs resolved at the same time
    #[arg(long, default_value_t = urlup::config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            input: cli.input,
            urls: cli.urls,
            output: cli.output,
            quiet: cli.quiet,
            explain: cli.explain,
            colorize: !cli.no_color,
            proxy_user: cli.user,
            proxy_password: cli.password,
            use_keyring: !cli.no_keyring,
            reset_keyring: cli.reset_keyring,
            cookies: cli.cookies.into_iter().collect::<BTreeMap<_, _>>(),
            headers: cli.headers.into_iter().collect::<BTreeMap<_, _>>(),
            max_attempts: cli.max_attempts,
            timeout_seconds: cli.timeout_seconds,
            concurrency: cli.concurrency,
            log_level: cli.log_level,
            log_format: cli.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from(Cli::parse());

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;
    if !config.colorize {
        colored::control::set_override(false);
    }
    if config.input.is_none() && config.urls.is_empty() {
        eprintln!("urlup: no URLs given (use --input FILE or list URLs as arguments)");
        process::exit(2);
    }

    match run_batch(config).await {
        Ok(report) => {
            eprintln!(
                "Resolved {} URL{} ({} succeeded, {} failed) in {:.1}s{}",
                report.total,
                if report.total == 1 { "" } else { "s" },
                report.succeeded,
                report.failed,
                report.elapsed_seconds,
                if report.interrupted { " (interrupted)" } else { "" }
            );
            if report.interrupted {
                process::exit(130);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("urlup error: {:#}", e);
            process::exit(1);
        }
    }
}
