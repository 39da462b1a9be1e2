//! Platform default proxy policy, read from the conventional environment
//! variables (`HTTP_PROXY`, `HTTPS_PROXY`, `ALL_PROXY`, `NO_PROXY`).

use http::Uri;
use url::{Host, Url};

use crate::endpoint::{ProxyEndpoint, DEFAULT_PROXY_PORT};
use crate::error::RouterError;
use crate::policy::{request_host, ProxyPolicy};

/// Proxy policy derived from the process environment.
///
/// Endpoints are resolved once when the policy is built. A policy with no
/// endpoints connects everything directly.
#[derive(Debug, Clone, Default)]
pub struct SystemPolicy {
    http: Option<ProxyEndpoint>,
    https: Option<ProxyEndpoint>,
    all: Option<ProxyEndpoint>,
    no_proxy: NoProxy,
}

impl SystemPolicy {
    /// A policy that never proxies.
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Upper-case names win over
    /// their lower-case forms.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&name.to_ascii_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let endpoint = |name: &str| var(name).and_then(|value| parse_proxy_var(name, &value));

        Self {
            http: endpoint("HTTP_PROXY"),
            https: endpoint("HTTPS_PROXY"),
            all: endpoint("ALL_PROXY"),
            no_proxy: var("NO_PROXY").map(|v| NoProxy::parse(&v)).unwrap_or_default(),
        }
    }

    fn for_scheme(&self, scheme: Option<&str>) -> Option<&ProxyEndpoint> {
        let specific = match scheme {
            Some(s) if s.eq_ignore_ascii_case("https") => self.https.as_ref(),
            Some(s) if s.eq_ignore_ascii_case("http") => self.http.as_ref(),
            _ => None,
        };
        specific.or(self.all.as_ref())
    }
}

impl ProxyPolicy for SystemPolicy {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxyEndpoint>, RouterError> {
        let host = request_host(uri)?;
        if self.no_proxy.matches(host) {
            return Ok(Vec::new());
        }
        Ok(self
            .for_scheme(uri.scheme_str())
            .cloned()
            .into_iter()
            .collect())
    }
}

/// Parse and resolve one proxy variable. Values that cannot be used are
/// logged and dropped so that scheme falls back to a direct connection.
fn parse_proxy_var(name: &str, value: &str) -> Option<ProxyEndpoint> {
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{value}")
    };

    let url = match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => {
            tracing::warn!(var = name, scheme = url.scheme(), "Unsupported proxy scheme, ignoring");
            return None;
        }
        Err(e) => {
            tracing::warn!(var = name, error = %e, "Unparsable proxy variable, ignoring");
            return None;
        }
    };

    let host = match url.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    let port = url.port_or_known_default().unwrap_or(DEFAULT_PROXY_PORT);

    match ProxyEndpoint::resolve(&host, port) {
        Ok(endpoint) => Some(endpoint),
        Err(e) => {
            tracing::warn!(
                var = name,
                proxy = %format!("{host}:{port}"),
                error = %e,
                "System proxy could not be resolved, ignoring"
            );
            None
        }
    }
}

/// `NO_PROXY` host patterns.
#[derive(Debug, Clone, Default)]
struct NoProxy {
    patterns: Vec<String>,
}

impl NoProxy {
    fn parse(value: &str) -> Self {
        Self {
            patterns: value
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    fn matches(&self, host: &str) -> bool {
        let host = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_ascii_lowercase();

        self.patterns.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            match pattern
                .strip_prefix("*.")
                .or_else(|| pattern.strip_prefix('.'))
            {
                Some(domain) => {
                    host == domain
                        || host
                            .strip_suffix(domain)
                            .is_some_and(|rest| rest.ends_with('.'))
                }
                None => host == *pattern,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn policy(vars: &[(&str, &str)]) -> SystemPolicy {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SystemPolicy::from_lookup(move |name| vars.get(name).cloned())
    }

    fn select(policy: &SystemPolicy, uri: &str) -> Vec<ProxyEndpoint> {
        policy.select(&uri.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_environment_is_direct() {
        let policy = policy(&[]);

        assert!(select(&policy, "https://cx.example.com/").is_empty());
        assert!(select(&policy, "http://other.example.com/").is_empty());
    }

    #[test]
    fn test_scheme_specific_variables() {
        let policy = policy(&[
            ("HTTP_PROXY", "http://127.0.0.1:3128"),
            ("HTTPS_PROXY", "127.0.0.1:3129"),
        ]);

        let http = select(&policy, "http://example.com/");
        let https = select(&policy, "https://example.com/");

        assert_eq!(http.len(), 1);
        assert_eq!(http[0].port(), 3128);
        assert_eq!(https.len(), 1);
        assert_eq!(https[0].port(), 3129);
    }

    #[test]
    fn test_all_proxy_is_fallback() {
        let policy = policy(&[("HTTP_PROXY", "127.0.0.1:3128"), ("ALL_PROXY", "127.0.0.1:9000")]);

        assert_eq!(select(&policy, "http://example.com/")[0].port(), 3128);
        assert_eq!(select(&policy, "https://example.com/")[0].port(), 9000);
    }

    #[test]
    fn test_lowercase_variables_and_default_port() {
        let policy = policy(&[("http_proxy", "127.0.0.1")]);

        let selected = select(&policy, "http://example.com/");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].port(), DEFAULT_PROXY_PORT);
    }

    #[test]
    fn test_uppercase_wins_over_lowercase() {
        let policy = policy(&[
            ("HTTPS_PROXY", "127.0.0.1:1111"),
            ("https_proxy", "127.0.0.1:2222"),
        ]);

        assert_eq!(select(&policy, "https://example.com/")[0].port(), 1111);
    }

    #[test]
    fn test_unsupported_scheme_is_ignored() {
        let policy = policy(&[("ALL_PROXY", "socks5://127.0.0.1:1080")]);

        assert!(select(&policy, "https://example.com/").is_empty());
    }

    #[test]
    fn test_no_proxy_patterns() {
        let policy = policy(&[
            ("ALL_PROXY", "127.0.0.1:9000"),
            ("NO_PROXY", "localhost, .internal.corp,*.svc.local ,Build.Example.com"),
        ]);

        assert!(select(&policy, "http://localhost:8080/").is_empty());
        assert!(select(&policy, "https://git.internal.corp/").is_empty());
        assert!(select(&policy, "https://internal.corp/").is_empty());
        assert!(select(&policy, "https://api.svc.local/").is_empty());
        assert!(select(&policy, "https://build.example.com/").is_empty());

        assert_eq!(select(&policy, "https://notinternal.corp/").len(), 1);
        assert_eq!(select(&policy, "https://example.com/").len(), 1);
    }

    #[test]
    fn test_no_proxy_wildcard() {
        let policy = policy(&[("ALL_PROXY", "127.0.0.1:9000"), ("NO_PROXY", "*")]);

        assert!(select(&policy, "https://anything.example.com/").is_empty());
    }

    #[test]
    fn test_uri_without_host_is_invalid() {
        let policy = SystemPolicy::direct();
        let result = policy.select(&"/relative".parse().unwrap());

        assert!(matches!(result, Err(RouterError::InvalidArgument(_))));
    }

    #[test]
    fn test_connect_failed_is_absorbed() {
        let policy = SystemPolicy::direct();
        let result = policy.connect_failed(
            &"https://example.com/".parse().unwrap(),
            "127.0.0.1:3128".parse().unwrap(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );

        assert!(result.is_ok());
    }
}
