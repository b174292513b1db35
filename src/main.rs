use tokio::signal;
use tracing::info;

use readiness_probe::{client, server, telemetry, Config, HealthState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Container HEALTHCHECK mode: probe our own liveness endpoint and exit.
    if std::env::args().nth(1).as_deref() == Some("--healthcheck") {
        return healthcheck(&config).await;
    }

    telemetry::init(&config.logging)?;
    info!(log_format = %config.logging.format, "readiness-probe starting");

    server::serve(config, HealthState::global(), shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// GET the liveness endpoint on loopback; exit 0 on 2xx, 1 otherwise.
async fn healthcheck(config: &Config) -> anyhow::Result<()> {
    let url = client::liveness_url(&config.probe);
    match client::probe_url(&url).await {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("healthcheck failed: {e:#}");
            std::process::exit(1);
        }
    }
}
