//! Per-URL progress lines printed while a batch runs.
//!
//! These lines are user feedback, not diagnostics, so they go to stdout
//! regardless of the log level. Quiet mode suppresses them.

use std::time::Duration;

use colored::*;
use reqwest::StatusCode;

use crate::error_handling::TransportError;
use crate::models::UrlResult;

/// How progress lines are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressOptions {
    /// Print nothing
    pub quiet: bool,
    /// Add the meaning of the status code on a second line
    pub explain: bool,
    /// Color-code lines by outcome
    pub colorize: bool,
}

/// Returns the canonical reason phrase for a status code.
pub fn status_meaning(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unrecognized status code")
}

/// Formats the line for a terminal result, without color.
pub fn format_result_line(result: &UrlResult, explain: bool) -> String {
    let mut line = match (&result.final_url, &result.error) {
        (Some(final_url), None) => {
            let code = result
                .status
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!("{} ==> {} [{}]", result.original, final_url, code)
        }
        (_, Some(error)) => format!("{}: {}", result.original, error),
        (None, None) => format!("{}: no result", result.original),
    };
    if explain {
        if let Some(code) = result.status {
            line.push_str(&format!(
                "\n   [status code {} = {}]",
                code,
                status_meaning(code)
            ));
        }
    }
    line
}

/// Prints the line for a terminal result.
pub fn report_result(result: &UrlResult, options: &ProgressOptions) {
    if options.quiet {
        return;
    }
    let line = format_result_line(result, options.explain);
    if !options.colorize {
        println!("{line}");
        return;
    }
    let colored_line = match (result.error.is_some(), result.status) {
        (true, _) => line.red(),
        (false, Some(code)) if code >= 300 => line.blue(),
        (false, _) => line.green(),
    };
    println!("{colored_line}");
}

/// Prints a warning before a transient failure is retried.
pub fn report_retry(url: &str, error: &TransportError, delay: Duration, options: &ProgressOptions) {
    if options.quiet {
        return;
    }
    let line = format!(
        "{} problem: {}; retrying in {}s",
        url,
        error,
        delay.as_secs_f64()
    );
    if options.colorize {
        println!("{}", line.yellow());
    } else {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::Failure;

    #[test]
    fn test_format_success_line() {
        let result = UrlResult::resolved("http://a.org", "https://www.a.org/".to_string(), 301);
        assert_eq!(
            format_result_line(&result, false),
            "http://a.org ==> https://www.a.org/ [301]"
        );
    }

    #[test]
    fn test_format_success_line_explained() {
        let result = UrlResult::resolved("http://a.org", "http://a.org".to_string(), 200);
        assert_eq!(
            format_result_line(&result, true),
            "http://a.org ==> http://a.org [200]\n   [status code 200 = OK]"
        );
    }

    #[test]
    fn test_format_error_line() {
        let result = UrlResult::failed("http://a.org/x", &Failure::NotFound, Some(404));
        assert_eq!(
            format_result_line(&result, false),
            "http://a.org/x: No content found at this location"
        );
        assert!(format_result_line(&result, true).ends_with("[status code 404 = Not Found]"));
    }

    #[test]
    fn test_status_meaning_unknown() {
        assert_eq!(status_meaning(202), "Accepted");
        assert_eq!(status_meaning(799), "unrecognized status code");
    }
}
