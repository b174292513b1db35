//! Probe listener: binds, serves the probe router, drains on shutdown.
//!
//! The binary runs this with [`HealthState::global`]; a process embedding the
//! library runs the same function next to the code that calls the setters.
//!
//! ```rust,ignore
//! let health = HealthState::global();
//! tokio::spawn(readiness_probe::server::serve(config, health.clone(), shutdown));
//!
//! informers.wait_for_cache_sync().await?;
//! health.set_caches_synced(true);
//! ```
//!
//! Shutdown sequence once `shutdown` resolves:
//!
//! 1. controllers-ready is cleared, so readiness answers 503
//! 2. the listener keeps accepting for `probe.shutdown_drain_secs`, letting
//!    the orchestrator observe the 503 and stop routing traffic here
//! 3. the listener closes and in-flight requests finish

use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

use crate::{
    api,
    config::{Config, ProbeConfig},
    health::HealthState,
};

/// Bind the configured address and serve until `shutdown` resolves and the
/// drain period has elapsed.
pub async fn serve<F>(config: Config, health: Arc<HealthState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = socket_addr(&config.probe)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding probe listener on {addr}"))?;

    serve_listener(listener, &config.probe, health, shutdown).await
}

/// Serve on an already-bound listener.
pub async fn serve_listener<F>(
    listener: TcpListener,
    probe: &ProbeConfig,
    health: Arc<HealthState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading probe listener address")?;
    info!(
        %addr,
        readiness_path = %probe.readiness_path,
        liveness_path = %probe.liveness_path,
        drain_secs = probe.shutdown_drain_secs,
        "probe listener ready"
    );

    let app = app(Arc::clone(&health), probe);
    axum::serve(listener, app)
        .with_graceful_shutdown(drain_then_close(health, shutdown, probe.shutdown_drain()))
        .await
        .context("probe server error")?;

    info!(%addr, "probe listener closed");
    Ok(())
}

/// Probe router with request-id and request tracing applied.
pub fn app(health: Arc<HealthState>, probe: &ProbeConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(tracing::Level::DEBUG));

    api::probes::router(health, probe)
        .layer(axum::middleware::from_fn(api::request_id::request_id_middleware))
        .layer(trace_layer)
}

fn socket_addr(probe: &ProbeConfig) -> anyhow::Result<SocketAddr> {
    let ip: IpAddr = probe
        .bind_address
        .parse()
        .with_context(|| format!("parsing bind address {}", probe.bind_address))?;
    Ok(SocketAddr::new(ip, probe.port))
}

/// Graceful-shutdown future: the listener stays open until this returns.
async fn drain_then_close<F>(health: Arc<HealthState>, shutdown: F, drain: Duration)
where
    F: Future<Output = ()>,
{
    shutdown.await;
    health.set_controllers_ready(false);
    info!(drain_secs = drain.as_secs(), "shutdown requested, readiness failing while draining");
    tokio::time::sleep(drain).await;
}
