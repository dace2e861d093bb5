use serde::Serialize;

use crate::error_handling::Failure;

/// Outcome of resolving one input URL.
///
/// Either `final_url` is set (with the status observed on the original
/// request) and `error` is empty, or `error` is set and `final_url` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlResult {
    /// The input string, trimmed
    pub original: String,
    /// Where the chain of redirections ended
    #[serde(rename = "final")]
    pub final_url: Option<String>,
    /// Status code of the first response for the original request
    pub status: Option<u16>,
    /// Why the URL could not be resolved
    pub error: Option<String>,
}

impl UrlResult {
    /// A URL that led to a destination.
    pub fn resolved(original: impl Into<String>, final_url: String, status: u16) -> Self {
        Self {
            original: original.into(),
            final_url: Some(final_url),
            status: Some(status),
            error: None,
        }
    }

    /// A URL that could not be resolved. `status` is the code observed on the
    /// original request, when there was a response at all.
    pub fn failed(original: impl Into<String>, failure: &Failure, status: Option<u16>) -> Self {
        Self {
            original: original.into(),
            final_url: None,
            status,
            error: Some(failure.to_string()),
        }
    }

    /// Returns true if the URL led to a destination.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.final_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_and_failed_are_complementary() {
        let ok = UrlResult::resolved("http://a.org", "https://a.org/".to_string(), 301);
        assert!(ok.is_success());
        assert_eq!(ok.status, Some(301));

        let bad = UrlResult::failed("http://a.org", &Failure::NotFound, Some(404));
        assert!(!bad.is_success());
        assert!(bad.final_url.is_none());
        assert_eq!(bad.error.as_deref(), Some("No content found at this location"));
    }

    #[test]
    fn test_serializes_final_field_name() {
        let ok = UrlResult::resolved("http://a.org", "http://a.org".to_string(), 200);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["final"], "http://a.org");
        assert_eq!(json["status"], 200);
        assert!(json["error"].is_null());
    }
}
