//! Configuration types and loading logic.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use router_tracing::TracingConfig;
use serde::Deserialize;

use crate::active::PolicySlot;
use crate::error::RouterError;

/// Top-level router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// The backend whose traffic is routed through the proxy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    /// Target server URL; only its host is used for matching.
    pub url: Option<String>,
}

/// Forward proxy settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySettings {
    /// Route target traffic through `host`. When false the system default
    /// policy stays in effect.
    #[serde(default)]
    pub enabled: bool,

    /// Proxy host without a scheme.
    pub host: Option<String>,

    /// Proxy port; 80 when absent.
    pub port: Option<u16>,
}

/// Settings for `--probe` requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl RouterConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (PROXY_ROUTER_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let config: RouterConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PROXY_ROUTER_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Configure `slot` from these settings.
    pub fn apply(&self, slot: &PolicySlot) -> Result<(), RouterError> {
        slot.configure(
            self.target.url.as_deref().unwrap_or_default(),
            self.proxy.enabled,
            self.proxy.host.as_deref(),
            self.proxy.port,
        )
    }
}
