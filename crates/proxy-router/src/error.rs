//! Error taxonomy for proxy configuration and selection.

use std::io;

use thiserror::Error;

/// Errors surfaced by the router.
///
/// Construction failures carry an operator-facing message only; the
/// low-level cause is written to the log where it was detected.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Bad caller input (empty proxy host, URI without a host).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Target server url is malformed.  Correct and retry.")]
    MalformedTargetUrl,

    #[error("Proxy address is malformed.  Correct and retry.")]
    MalformedProxyAddress,

    /// A selected proxy could not be reached. Not retried at this layer.
    #[error("Connection could not be established to proxy: {host}:{port}")]
    ConnectionEscalation {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
}

impl RouterError {
    /// Whether this error should be handled as a process-level alarm
    /// rather than a per-call failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouterError::ConnectionEscalation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_only_escalation_is_fatal() {
        let escalation = RouterError::ConnectionEscalation {
            host: "proxy.corp.local".to_string(),
            port: 8080,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };

        assert!(escalation.is_fatal());
        assert!(!RouterError::MalformedTargetUrl.is_fatal());
        assert!(!RouterError::MalformedProxyAddress.is_fatal());
        assert!(!RouterError::InvalidArgument("proxy host cannot be empty").is_fatal());
    }

    #[test]
    fn test_escalation_keeps_cause_as_source() {
        let err = RouterError::ConnectionEscalation {
            host: "proxy.corp.local".to_string(),
            port: 8080,
            source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
        };

        assert_eq!(
            err.to_string(),
            "Connection could not be established to proxy: proxy.corp.local:8080"
        );
        assert_eq!(err.source().unwrap().to_string(), "connect timed out");
    }

    #[test]
    fn test_construction_messages_are_operator_actionable() {
        assert!(RouterError::MalformedTargetUrl
            .to_string()
            .ends_with("Correct and retry."));
        assert!(RouterError::MalformedProxyAddress
            .to_string()
            .ends_with("Correct and retry."));
    }
}
