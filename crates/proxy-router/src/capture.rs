//! One-time capture of the platform default proxy policy.
//!
//! The capture reads the environment, never the active slot, so it cannot
//! observe a policy installed by this crate.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::policy::ProxyPolicy;
use crate::system::SystemPolicy;

static CAPTURED: Lazy<Arc<dyn ProxyPolicy>> = Lazy::new(|| {
    let policy = SystemPolicy::from_env();
    tracing::debug!(policy = ?policy, "Captured system default proxy policy");
    Arc::new(policy)
});

/// The platform default policy as it was on first access.
pub fn default_policy() -> Arc<dyn ProxyPolicy> {
    Arc::clone(&CAPTURED)
}
