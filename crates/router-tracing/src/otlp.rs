//! Subscriber installation and the OTLP exporter guard.

use anyhow::Result;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{OtlpProtocol, TracingConfig};

/// RAII guard that flushes and shuts down the tracer provider on drop.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// Whether spans are being exported to an OTLP collector.
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(ref mut provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown tracer provider: {e}");
            }
        }
    }
}

fn env_filter(config: &TracingConfig) -> EnvFilter {
    EnvFilter::try_new(config.filter_directives()).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_fmt_only(config: &TracingConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(config))
        .init();
}

/// Install the global subscriber: stderr fmt logging filtered by
/// [`TracingConfig::filter_directives`], plus OTLP export when
/// `otlp_endpoint` is set.
///
/// An exporter that cannot be built is not fatal; the router falls back to
/// fmt-only logging and records a warning.
///
/// Hold the returned [`TracingGuard`] for the lifetime of the process so
/// pending spans are flushed on shutdown.
pub fn init_tracing(config: &TracingConfig) -> TracingGuard {
    let endpoint = match config.otlp_endpoint.as_deref() {
        Some(endpoint) if config.otlp_enabled() => endpoint,
        _ => {
            init_fmt_only(config);
            return TracingGuard { provider: None };
        }
    };

    match build_provider(config, endpoint) {
        Ok(provider) => {
            let tracer = provider.tracer(config.service_name.clone());
            tracing_subscriber::registry()
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .with(env_filter(config))
                .init();

            tracing::info!(
                endpoint = %endpoint,
                service = %config.service_name,
                protocol = ?config.protocol,
                "OpenTelemetry OTLP tracing initialized"
            );

            TracingGuard {
                provider: Some(provider),
            }
        }
        Err(e) => {
            init_fmt_only(config);
            tracing::warn!(
                error = %e,
                endpoint = %endpoint,
                "OTLP exporter failed to initialize, running with fmt-only tracing"
            );
            TracingGuard { provider: None }
        }
    }
}

/// Build a batching tracer provider for the configured protocol.
fn build_provider(config: &TracingConfig, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = match config.protocol {
        OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?,
        OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()?,
    };

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder_empty()
                .with_service_name(config.service_name.clone())
                .build(),
        )
        .build())
}
