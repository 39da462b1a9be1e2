//! Resolved forward-proxy endpoints.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use serde::Serialize;

/// Port used when a proxy is configured without one.
pub const DEFAULT_PROXY_PORT: u16 = 80;

/// An HTTP forward proxy, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
    addr: SocketAddr,
}

impl ProxyEndpoint {
    /// Resolve `host:port` with the platform resolver; the first address wins.
    ///
    /// Blocks for as long as the resolver does.
    pub fn resolve(host: &str, port: u16) -> io::Result<Self> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {host}"),
            )
        })?;

        Ok(Self {
            host: host.to_string(),
            port,
            addr,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Proxy URL handed to HTTP clients; uses the resolved address so no
    /// further lookups happen per request.
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ip_literal() {
        let endpoint = ProxyEndpoint::resolve("127.0.0.1", 8080).unwrap();

        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(endpoint.to_string(), "127.0.0.1:8080");
        assert_eq!(endpoint.proxy_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_display_keeps_configured_host() {
        let endpoint = ProxyEndpoint::resolve("localhost", DEFAULT_PROXY_PORT).unwrap();

        assert_eq!(endpoint.to_string(), "localhost:80");
        assert_eq!(endpoint.addr().port(), 80);
    }

    #[test]
    fn test_resolve_rejects_scheme_in_host() {
        assert!(ProxyEndpoint::resolve("http://proxy.corp.local", 8080).is_err());
    }

    #[test]
    fn test_serializes_host_port_and_addr() {
        let endpoint = ProxyEndpoint::resolve("127.0.0.1", 3128).unwrap();
        let json = serde_json::to_value(&endpoint).unwrap();

        assert_eq!(json["host"], "127.0.0.1");
        assert_eq!(json["port"], 3128);
        assert_eq!(json["addr"], "127.0.0.1:3128");
    }
}
