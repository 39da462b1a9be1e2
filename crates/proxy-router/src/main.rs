//! proxy-router: install a selective proxy policy and report the routing
//! decisions it makes.

use std::time::{Duration, Instant};

use anyhow::Context;
use http::Uri;
use proxy_router::config::RouterConfig;
use proxy_router::{active, client, ActiveState, ProxyEndpoint};
use serde::Serialize;
use tracing::Instrument;

/// One `--check` result, printed as a JSON line.
#[derive(Serialize)]
struct RouteReport<'a> {
    uri: &'a str,
    state: ActiveState,
    proxies: Vec<ProxyEndpoint>,
}

/// Every value given for `flag`. A flag without a value is an error.
fn flag_values(args: &[String], flag: &str) -> anyhow::Result<Vec<String>> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            match iter.next() {
                Some(value) if !value.starts_with("--") => values.push(value.clone()),
                _ => anyhow::bail!("{flag} requires a value"),
            }
        }
    }
    Ok(values)
}

/// The last value given for `flag`.
fn flag_value(args: &[String], flag: &str) -> anyhow::Result<Option<String>> {
    Ok(flag_values(args, flag)?.pop())
}

fn parse_port(value: &str) -> anyhow::Result<u16> {
    value
        .parse()
        .with_context(|| format!("--proxy-port expects a port number, got {value:?}"))
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = flag_value(&args, "--config")?
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("PROXY_ROUTER_CONFIG").ok())
        .unwrap_or_else(|| "proxy-router.toml".to_string());

    let mut config = RouterConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if let Some(url) = flag_value(&args, "--target-url")? {
        config.target.url = Some(url);
    }
    if let Some(host) = flag_value(&args, "--proxy-host")? {
        config.proxy.host = Some(host);
        config.proxy.enabled = true;
    }
    if let Some(port) = flag_value(&args, "--proxy-port")? {
        config.proxy.port = Some(parse_port(&port)?);
    }
    let checks = flag_values(&args, "--check")?;
    let probe = flag_value(&args, "--probe")?;

    // The OTLP gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = router_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            target_url = ?config.target.url,
            proxy_enabled = config.proxy.enabled,
            otlp_export = tracing_guard.exporting(),
            "Starting proxy-router"
        );

        run(config, checks, probe).await
    })
}

async fn run(config: RouterConfig, checks: Vec<String>, probe: Option<String>) -> anyhow::Result<()> {
    // Capture the platform default before anything is installed
    let _ = proxy_router::default_policy();
    config.apply(active::global())?;

    for uri in &checks {
        check(uri)?;
    }

    if let Some(url) = probe {
        probe_url(&url, config.probe.timeout_secs).await?;
    }
    Ok(())
}

fn check(uri: &str) -> anyhow::Result<()> {
    let span = router_tracing::route_check_span!(uri);
    let _entered = span.enter();

    let parsed: Uri = uri.parse()?;
    let proxies = active::current().select(&parsed)?;
    span.record("proxied", !proxies.is_empty());

    let report = RouteReport {
        uri,
        state: active::state(),
        proxies,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

/// GET `url` through the active policy. An unreachable configured proxy
/// is escalated and ends the process with an error.
async fn probe_url(url: &str, timeout_secs: u64) -> anyhow::Result<()> {
    let url: reqwest::Url = url.parse()?;
    let span = router_tracing::probe_request_span!(url);
    send_probe(url, Duration::from_secs(timeout_secs))
        .instrument(span)
        .await
}

async fn send_probe(url: reqwest::Url, timeout: Duration) -> anyhow::Result<()> {
    let client = client::client_builder().timeout(timeout).build()?;
    let start = Instant::now();

    let result = client.get(url.clone()).send().await;
    let latency = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency);

    match result {
        Ok(resp) => {
            let status = resp.status().as_u16();
            tracing::Span::current().record("status", status);
            tracing::info!(status, latency_ms = latency, "Probe request complete");
            Ok(())
        }
        Err(e) => match client::report_connect_failure(&url, &e) {
            Err(escalation) if escalation.is_fatal() => {
                tracing::error!(error = %escalation, "Configured proxy unreachable, shutting down");
                Err(escalation.into())
            }
            _ => {
                tracing::warn!(error = %e, latency_ms = latency, "Probe request failed");
                Err(e.into())
            }
        },
    }
}
