//! Selective routing: send traffic for the target server through a fixed
//! forward proxy and leave everything else to the default policy.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Uri;
use url::{Host, Url};

use crate::capture::default_policy;
use crate::endpoint::{ProxyEndpoint, DEFAULT_PROXY_PORT};
use crate::error::RouterError;
use crate::policy::{request_host, ProxyPolicy};

/// Proxy policy for a single target server.
///
/// Immutable once built; safe to share across threads and to publish as the
/// active policy.
#[derive(Debug)]
pub struct SelectiveRouter {
    default_policy: Arc<dyn ProxyPolicy>,
    target: Url,
    target_host: String,
    endpoint: ProxyEndpoint,
    proxies: Vec<ProxyEndpoint>,
}

impl SelectiveRouter {
    /// Build a router that proxies `target_url`'s host through
    /// `proxy_host:proxy_port` (port 80 when absent) and delegates every
    /// other request to `default_policy`.
    ///
    /// Resolves `proxy_host` with the platform resolver.
    pub fn new(
        default_policy: Arc<dyn ProxyPolicy>,
        target_url: &str,
        proxy_host: &str,
        proxy_port: Option<u16>,
    ) -> Result<Self, RouterError> {
        if proxy_host.is_empty() {
            return Err(RouterError::InvalidArgument("proxy host cannot be empty"));
        }
        let proxy_port = proxy_port.unwrap_or(DEFAULT_PROXY_PORT);

        let (target, target_host) = parse_target(target_url)?;
        let endpoint = resolve_proxy(proxy_host, proxy_port)?;

        tracing::info!(
            target_url = %target_url,
            proxy = %endpoint,
            "Configuring proxy for target server"
        );

        Ok(Self {
            default_policy,
            target,
            target_host,
            proxies: vec![endpoint.clone()],
            endpoint,
        })
    }

    /// Same as [`SelectiveRouter::new`], delegating to the captured
    /// platform default.
    pub fn with_captured_default(
        target_url: &str,
        proxy_host: &str,
        proxy_port: Option<u16>,
    ) -> Result<Self, RouterError> {
        Self::new(default_policy(), target_url, proxy_host, proxy_port)
    }

    pub fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    pub fn target_url(&self) -> &Url {
        &self.target
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    /// Exact, case-insensitive host comparison. Scheme, port and path are
    /// ignored; subdomains do not match.
    ///
    /// The request host is put in the same canonical form `Url` gives the
    /// target (`127.1` is `127.0.0.1`, IPv6 is compressed).
    fn matches_target(&self, host: &str) -> bool {
        match Host::parse(host) {
            Ok(canonical) => canonical.to_string().eq_ignore_ascii_case(&self.target_host),
            Err(_) => host.eq_ignore_ascii_case(&self.target_host),
        }
    }
}

impl ProxyPolicy for SelectiveRouter {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxyEndpoint>, RouterError> {
        let host = request_host(uri)?;
        tracing::debug!(uri = %uri, "Selecting proxy for uri");

        if self.matches_target(host) {
            tracing::info!(proxy = %self.endpoint, "Using proxy for target server");
            return Ok(self.proxies.clone());
        }
        self.default_policy.select(uri)
    }

    fn connect_failed(
        &self,
        uri: &Uri,
        addr: SocketAddr,
        cause: io::Error,
    ) -> Result<(), RouterError> {
        // Only the configured proxy is ours to escalate; anything else was
        // picked by the default policy.
        let ours = request_host(uri).is_ok_and(|host| self.matches_target(host));
        if !ours {
            return self.default_policy.connect_failed(uri, addr, cause);
        }

        tracing::error!(
            uri = %uri,
            proxy = %self.endpoint,
            addr = %addr,
            error = %cause,
            "Connection could not be established to target server proxy"
        );
        Err(RouterError::ConnectionEscalation {
            host: self.endpoint.host().to_string(),
            port: self.endpoint.port(),
            source: cause,
        })
    }
}

fn parse_target(target_url: &str) -> Result<(Url, String), RouterError> {
    let target = Url::parse(target_url).map_err(|e| {
        tracing::error!(target_url = %target_url, error = %e, "{}", RouterError::MalformedTargetUrl);
        RouterError::MalformedTargetUrl
    })?;

    let Some(host) = target.host_str().filter(|h| !h.is_empty()) else {
        tracing::error!(target_url = %target_url, error = "url has no host", "{}", RouterError::MalformedTargetUrl);
        return Err(RouterError::MalformedTargetUrl);
    };
    let host = host.to_string();
    Ok((target, host))
}

fn resolve_proxy(proxy_host: &str, proxy_port: u16) -> Result<ProxyEndpoint, RouterError> {
    ProxyEndpoint::resolve(proxy_host, proxy_port).map_err(|e| {
        tracing::error!(
            proxy = %format!("{proxy_host}:{proxy_port}"),
            error = %e,
            "{}",
            RouterError::MalformedProxyAddress
        );
        RouterError::MalformedProxyAddress
    })
}
