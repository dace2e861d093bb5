// In-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CookieMap, RedirectHop, Transport, TransportRequest, TransportResponse};
use crate::error_handling::TransportError;

type Outcome = Result<TransportResponse, TransportError>;

/// Answers requests from per-URL queues of canned outcomes.
///
/// Outcomes for a URL are consumed in order; the last one repeats.
/// A request to a URL with no script panics.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(&self, url: &str, outcome: Outcome) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub(crate) fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&request.url)
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url));
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

/// A response with no redirects.
pub(crate) fn respond(status: u16, final_url: &str) -> Outcome {
    Ok(TransportResponse {
        status,
        final_url: final_url.to_string(),
        cookies: CookieMap::new(),
        history: Vec::new(),
    })
}

/// A response reached through the given redirect hops.
pub(crate) fn respond_after(hops: &[(&str, u16)], status: u16, final_url: &str) -> Outcome {
    Ok(TransportResponse {
        status,
        final_url: final_url.to_string(),
        cookies: CookieMap::new(),
        history: hops
            .iter()
            .map(|(url, status)| RedirectHop {
                url: url.to_string(),
                status: *status,
            })
            .collect(),
    })
}

/// A response that sets cookies.
pub(crate) fn respond_with_cookies(status: u16, url: &str, cookies: &[(&str, &str)]) -> Outcome {
    Ok(TransportResponse {
        status,
        final_url: url.to_string(),
        cookies: cookies
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        history: Vec::new(),
    })
}
