//! Tracing bootstrap shared by the proxy-router binary and its tooling.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig, LOG_ENV_VAR};
pub use otlp::{init_tracing, TracingGuard};
