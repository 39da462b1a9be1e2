//! Span builder helpers for proxy-router instrumentation.

/// Create a span for an operator-requested route check.
///
/// Usage: `let _span = route_check_span!(uri).entered();`
///
/// `proxied` is recorded once the active policy has answered.
#[macro_export]
macro_rules! route_check_span {
    ($uri:expr) => {
        tracing::info_span!(
            "route_check",
            uri = %$uri,
            proxied = tracing::field::Empty,
        )
    };
}

/// Create a span for a probe request sent through the active policy.
#[macro_export]
macro_rules! probe_request_span {
    ($url:expr) => {
        tracing::info_span!(
            "probe_request",
            url = %$url,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
