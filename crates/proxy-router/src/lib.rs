//! Selective proxy routing.
//!
//! Requests addressed to one target server are sent through a configured
//! forward proxy; everything else follows the platform default policy
//! captured at startup.
//!
//! ```no_run
//! use proxy_router::active;
//!
//! # fn main() -> Result<(), proxy_router::RouterError> {
//! active::configure_proxy("https://cx.example.com", true, Some("proxy.corp.local"), Some(8080))?;
//! let client = proxy_router::client::client_builder().build();
//! # let _ = client;
//! # Ok(())
//! # }
//! ```

pub mod active;
pub mod capture;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod policy;
pub mod selective;
pub mod system;

pub use active::{configure_proxy, ActiveState, PolicySlot};
pub use capture::default_policy;
pub use endpoint::{ProxyEndpoint, DEFAULT_PROXY_PORT};
pub use error::RouterError;
pub use policy::ProxyPolicy;
pub use selective::SelectiveRouter;
pub use system::SystemPolicy;
