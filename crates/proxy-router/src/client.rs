//! `reqwest` integration: route client traffic through the active policy
//! and feed connect failures back to it.

use std::error::Error as _;
use std::io;

use http::Uri;
use reqwest::Url;

use crate::active;
use crate::endpoint::ProxyEndpoint;
use crate::error::RouterError;

/// A `reqwest::Proxy` that asks the active policy for every request.
///
/// Requests the policy routes directly get no proxy from this entry.
pub fn policy_proxy() -> reqwest::Proxy {
    reqwest::Proxy::custom(|url: &Url| proxy_for(url))
}

/// Client builder with environment proxies disabled in favour of the
/// active policy, which already accounts for them.
pub fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().no_proxy().proxy(policy_proxy())
}

fn proxy_for(url: &Url) -> Option<String> {
    let uri: Uri = url.as_str().parse().ok()?;
    match active::current().select(&uri) {
        Ok(proxies) => proxies.first().map(ProxyEndpoint::proxy_url),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Proxy selection failed, connecting directly");
            None
        }
    }
}

/// Notify the active policy that a request to `url` failed to connect.
///
/// The proxy is recovered by selecting for `url` again, and the policy that
/// picked it receives the failure: a selective router escalates only for
/// its target host and hands other hosts to its default policy. Errors
/// other than connect failures, and requests that were routed directly,
/// are ignored. A fatal [`RouterError::ConnectionEscalation`] means the
/// configured proxy itself is unreachable.
pub fn report_connect_failure(url: &Url, err: &reqwest::Error) -> Result<(), RouterError> {
    if !err.is_connect() {
        return Ok(());
    }
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|_| RouterError::InvalidArgument("request url is not a valid URI"))?;

    let policy = active::current();
    let Some(endpoint) = policy.select(&uri)?.into_iter().next() else {
        return Ok(());
    };
    policy.connect_failed(&uri, endpoint.addr(), io_cause(err))
}

/// Rebuild the I/O error underneath a reqwest error, keeping its kind.
fn io_cause(err: &reqwest::Error) -> io::Error {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return io::Error::new(io_err.kind(), err.to_string());
        }
        source = e.source();
    }
    io::Error::other(err.to_string())
}
