//! Institutional proxy support.
//!
//! - `convention`: recognizing proxy-routed URLs and taking them apart
//! - `authenticator`: logging in once per proxy host and caching the session

mod authenticator;
mod convention;

pub use authenticator::{LoginSettings, ProxyAuthenticator, ProxySession};
pub use convention::{
    distinct_proxy_hosts, inner_url_of, proxy_host_of, url_uses_proxy, EzProxyConvention,
    ProxyConvention,
};
