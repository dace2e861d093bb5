//! URL conventions of the institutional proxy.
//!
//! The detection and rewriting rules here are deliberately narrow string
//! heuristics for one proxy product (EZproxy-style starting-point URLs such as
//! `https://proxy.library.example.edu/login?url=https://doi.org/...`).
//! They sit behind [`ProxyConvention`] so that a different proxy scheme can be
//! plugged in without touching the resolver.

use std::collections::BTreeSet;

use crate::config::PROXY_LOGIN_PATH;

/// How proxy-routed URLs are recognized and taken apart.
pub trait ProxyConvention: Send + Sync {
    /// Returns true if `url` goes through the proxy.
    fn uses_proxy(&self, url: &str) -> bool;

    /// Scheme and authority of the proxy that `url` goes through.
    fn proxy_host(&self, url: &str) -> String;

    /// The destination wrapped inside a proxied URL, if it has one.
    fn inner_url(&self, url: &str) -> Option<String>;

    /// Where to POST the login form for `proxy_host`.
    fn login_url(&self, proxy_host: &str) -> String;
}

/// The EZproxy-style convention.
#[derive(Debug, Default, Clone, Copy)]
pub struct EzProxyConvention;

impl ProxyConvention for EzProxyConvention {
    fn uses_proxy(&self, url: &str) -> bool {
        url_uses_proxy(url)
    }

    fn proxy_host(&self, url: &str) -> String {
        proxy_host_of(url)
    }

    fn inner_url(&self, url: &str) -> Option<String> {
        inner_url_of(url)
    }

    fn login_url(&self, proxy_host: &str) -> String {
        format!("{proxy_host}{PROXY_LOGIN_PATH}")
    }
}

/// True iff the URL text contains `proxy` (case-sensitive).
///
/// Known limitation: any URL that merely mentions "proxy" is treated as
/// proxy-routed.
pub fn url_uses_proxy(url: &str) -> bool {
    url.contains("proxy")
}

/// Everything before the first `/` that follows the scheme delimiter.
///
/// `https://proxy.example.edu/login?url=x` gives `https://proxy.example.edu`.
pub fn proxy_host_of(url: &str) -> String {
    let authority_start = url.find("://").map(|idx| idx + 3).unwrap_or(0);
    match url[authority_start..].find('/') {
        Some(idx) => url[..authority_start + idx].to_string(),
        None => url.to_string(),
    }
}

/// Everything after the first `url=` marker.
pub fn inner_url_of(proxied_url: &str) -> Option<String> {
    proxied_url
        .find("url=")
        .map(|idx| &proxied_url[idx + "url=".len()..])
        .filter(|inner| !inner.is_empty())
        .map(str::to_string)
}

/// The distinct proxy hosts referenced by `urls`, sorted.
pub fn distinct_proxy_hosts<'a, I>(convention: &dyn ProxyConvention, urls: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    urls.into_iter()
        .map(str::trim)
        .filter(|url| !url.is_empty() && convention.uses_proxy(url))
        .map(|url| convention.proxy_host(url))
        .collect()
}
