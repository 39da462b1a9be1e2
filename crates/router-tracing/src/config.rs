//! Tracing configuration types.

use serde::Deserialize;

/// Environment variable whose directives replace `log_level` when set.
pub const LOG_ENV_VAR: &str = "PROXY_ROUTER_LOG";

/// Configuration for the logging and OpenTelemetry subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// The service name reported to the OTLP collector.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// OTLP collector endpoint (e.g. "http://localhost:4317").
    /// When `None`, OTLP export is disabled and only fmt logging is used.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Transport protocol for OTLP export.
    #[serde(default)]
    pub protocol: OtlpProtocol,

    /// `EnvFilter` directives. The default keeps the router's own decisions
    /// at `info` and everything else (reqwest, hyper, the exporter) at `warn`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// OTLP transport protocol.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

fn default_service_name() -> String {
    "proxy-router".to_string()
}

fn default_log_level() -> String {
    "proxy_router=info,router_tracing=info,warn".to_string()
}

impl TracingConfig {
    /// Filter directives in effect: [`LOG_ENV_VAR`] when set, `log_level`
    /// otherwise.
    pub fn filter_directives(&self) -> String {
        self.filter_directives_with(|name| std::env::var(name).ok())
    }

    fn filter_directives_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(LOG_ENV_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.log_level.clone())
    }

    /// Whether spans should be exported to an OTLP collector.
    pub fn otlp_enabled(&self) -> bool {
        self.otlp_endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            otlp_endpoint: None,
            protocol: OtlpProtocol::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};
    use figment::Figment;

    #[test]
    fn test_empty_table_uses_defaults() {
        let config: TracingConfig = Figment::from(Toml::string("")).extract().unwrap();

        assert_eq!(config.service_name, "proxy-router");
        assert_eq!(config.log_level, "proxy_router=info,router_tracing=info,warn");
        assert_eq!(config.protocol, OtlpProtocol::Grpc);
        assert!(!config.otlp_enabled());
    }

    #[test]
    fn test_log_env_var_overrides_config() {
        let config = TracingConfig::default();

        let overridden =
            config.filter_directives_with(|name| (name == LOG_ENV_VAR).then(|| "proxy_router=trace".to_string()));
        let blank = config.filter_directives_with(|_| Some("  ".to_string()));
        let unset = config.filter_directives_with(|_| None);

        assert_eq!(overridden, "proxy_router=trace");
        assert_eq!(blank, config.log_level);
        assert_eq!(unset, config.log_level);
    }

    #[test]
    fn test_blank_endpoint_disables_export() {
        let config: TracingConfig = Figment::from(Toml::string(r#"otlp_endpoint = " ""#))
            .extract()
            .unwrap();

        assert!(!config.otlp_enabled());
    }

    #[test]
    fn test_protocol_is_lowercase() {
        let toml = r#"
            otlp_endpoint = "http://collector:4318"
            protocol = "http"
            log_level = "proxy_router=debug"
        "#;
        let config: TracingConfig = Figment::from(Toml::string(toml)).extract().unwrap();

        assert_eq!(config.protocol, OtlpProtocol::Http);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4318"));
        assert!(config.otlp_enabled());
        assert_eq!(config.log_level, "proxy_router=debug");
    }
}
