//! Logger initialization.

use std::io::Write;

use colored::*;
use log::{Level, LevelFilter, Record};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first and `level` is applied on top of it, so
/// `RUST_LOG=reqwest=debug` still works for dependency tracing while
/// `--log-level` controls this crate. Logs go to stderr; per-URL progress
/// lines are printed separately on stdout.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already set.
///
/// # Examples
///
/// ```bash
/// urlup --log-level debug http://caltech.edu
/// RUST_LOG=hyper=debug urlup --log-format json -i urls.txt
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    let noisy = dependency_level(level);
    builder.filter_module("reqwest", noisy);
    builder.filter_module("hyper", noisy);
    builder.filter_module("hyper_util", noisy);
    builder.filter_module("urlup", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] {}",
                    record.target().cyan(),
                    colored_level(record.level()),
                    record.args()
                )
            });
        }
    }

    // try_init so tests that set up logging more than once get an error, not a panic
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// HTTP stack crates never log above Warn, and stay quieter if `level` is.
fn dependency_level(level: LevelFilter) -> LevelFilter {
    level.min(LevelFilter::Warn)
}

fn colored_level(level: Level) -> ColoredString {
    let text = level.to_string();
    match level {
        Level::Error => text.red(),
        Level::Warn => text.yellow(),
        Level::Info => text.green(),
        Level::Debug => text.blue(),
        Level::Trace => text.purple(),
    }
}

/// One JSON object per record: `ts` (epoch millis), `level`, `target`, `msg`.
fn json_line(record: &Record<'_>) -> String {
    serde_json::json!({
        "ts": chrono::Utc::now().timestamp_millis(),
        "level": record.level().to_string(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
    .to_string()
}
