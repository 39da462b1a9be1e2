//! The proxy-selection capability consulted for every outgoing connection.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use http::Uri;

use crate::endpoint::ProxyEndpoint;
use crate::error::RouterError;

/// A strategy that picks the proxies for an outgoing request.
///
/// `select` is called concurrently from every connection site and must not
/// block. An empty list means "connect directly".
pub trait ProxyPolicy: Send + Sync + fmt::Debug {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxyEndpoint>, RouterError>;

    /// Called when a connection to a proxy returned by `select` failed.
    fn connect_failed(
        &self,
        uri: &Uri,
        addr: SocketAddr,
        cause: io::Error,
    ) -> Result<(), RouterError> {
        tracing::warn!(
            uri = %uri,
            proxy = %addr,
            error = %cause,
            "Connection to proxy failed"
        );
        Ok(())
    }
}

/// Host of the request URI; a URI without one is a caller error.
pub(crate) fn request_host(uri: &Uri) -> Result<&str, RouterError> {
    uri.host()
        .filter(|host| !host.is_empty())
        .ok_or(RouterError::InvalidArgument("request URI must carry a host"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_host_extracts_host() {
        let uri: Uri = "https://cx.example.com:8443/path".parse().unwrap();
        assert_eq!(request_host(&uri).unwrap(), "cx.example.com");
    }

    #[test]
    fn test_request_host_rejects_relative_uri() {
        let uri: Uri = "/only/a/path".parse().unwrap();
        assert!(matches!(
            request_host(&uri),
            Err(RouterError::InvalidArgument(_))
        ));
    }
}
