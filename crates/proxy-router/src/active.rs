//! The process-wide active proxy policy.
//!
//! Exactly one policy is active at any time: the captured default or an
//! installed [`SelectiveRouter`]. Readers clone an `Arc` under a momentary
//! read lock and select without holding it; writers replace the whole
//! policy in one store.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;

use crate::capture::default_policy;
use crate::error::RouterError;
use crate::policy::ProxyPolicy;
use crate::selective::SelectiveRouter;

/// Which kind of policy the slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveState {
    Default,
    CustomInstalled,
}

#[derive(Clone)]
enum Installed {
    Default,
    Custom(Arc<SelectiveRouter>),
}

/// A swappable active-policy slot.
///
/// The global slot is reached through the free functions of this module;
/// separate instances exist so callers can isolate routing decisions.
pub struct PolicySlot {
    default: Arc<dyn ProxyPolicy>,
    installed: RwLock<Installed>,
}

impl PolicySlot {
    /// A slot whose default (and initial) policy is `default`.
    pub fn new(default: Arc<dyn ProxyPolicy>) -> Self {
        Self {
            default,
            installed: RwLock::new(Installed::Default),
        }
    }

    /// The policy that `uninstall` restores.
    pub fn default_policy(&self) -> Arc<dyn ProxyPolicy> {
        Arc::clone(&self.default)
    }

    /// The currently active policy.
    pub fn current(&self) -> Arc<dyn ProxyPolicy> {
        match &*self.installed.read() {
            Installed::Default => Arc::clone(&self.default),
            Installed::Custom(router) => Arc::clone(router) as Arc<dyn ProxyPolicy>,
        }
    }

    pub fn state(&self) -> ActiveState {
        match &*self.installed.read() {
            Installed::Default => ActiveState::Default,
            Installed::Custom(_) => ActiveState::CustomInstalled,
        }
    }

    /// Publish `router` as the active policy. Connections that already
    /// selected a proxy are unaffected.
    pub fn install(&self, router: Arc<SelectiveRouter>) {
        tracing::debug!(
            target_host = %router.target_host(),
            proxy = %router.endpoint(),
            "Installing selective proxy policy"
        );
        *self.installed.write() = Installed::Custom(router);
    }

    /// Restore the default policy.
    pub fn uninstall(&self) {
        tracing::info!("No proxy configured for target server, using system default");
        *self.installed.write() = Installed::Default;
    }

    /// Configuration entry point.
    ///
    /// With `use_proxy`, builds a [`SelectiveRouter`] over this slot's
    /// default and installs it. Otherwise restores the default. A failed
    /// construction leaves the slot untouched.
    pub fn configure(
        &self,
        target_url: &str,
        use_proxy: bool,
        proxy_host: Option<&str>,
        proxy_port: Option<u16>,
    ) -> Result<(), RouterError> {
        if !use_proxy {
            self.uninstall();
            return Ok(());
        }

        let proxy_host = proxy_host
            .filter(|h| !h.is_empty())
            .ok_or(RouterError::InvalidArgument("proxy host cannot be empty"))?;

        let router = SelectiveRouter::new(self.default_policy(), target_url, proxy_host, proxy_port)?;
        self.install(Arc::new(router));
        tracing::info!("Target server proxy configured");
        Ok(())
    }
}

static ACTIVE: Lazy<PolicySlot> = Lazy::new(|| PolicySlot::new(default_policy()));

/// The process-wide slot consulted by [`crate::client`].
pub fn global() -> &'static PolicySlot {
    &ACTIVE
}

pub fn current() -> Arc<dyn ProxyPolicy> {
    ACTIVE.current()
}

pub fn state() -> ActiveState {
    ACTIVE.state()
}

pub fn install(router: Arc<SelectiveRouter>) {
    ACTIVE.install(router)
}

pub fn uninstall() {
    ACTIVE.uninstall()
}

/// Configure the process-wide policy. See [`PolicySlot::configure`].
pub fn configure_proxy(
    target_url: &str,
    use_proxy: bool,
    proxy_host: Option<&str>,
    proxy_port: Option<u16>,
) -> Result<(), RouterError> {
    ACTIVE.configure(target_url, use_proxy, proxy_host, proxy_port)
}
