//! Self-probe client behind `readiness-probe --healthcheck`.
//!
//! Container runtimes run `HEALTHCHECK` commands inside the image; shipping
//! this check in the binary means the image needs no curl or wget.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

use crate::config::ProbeConfig;

/// Upper bound on a single self-probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// URL of the liveness endpoint on the loopback interface.
pub fn liveness_url(probe: &ProbeConfig) -> String {
    format!("http://127.0.0.1:{}{}", probe.port, probe.liveness_path)
}

/// GET `url` and report whether it answered with a 2xx status.
///
/// Connection failures are errors; a non-2xx answer is `Ok(false)`.
pub async fn probe_url(url: &str) -> anyhow::Result<bool> {
    let client = Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("building reqwest client")?;

    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let ok = resp.status().is_success();
    tracing::debug!(url, status = %resp.status(), ok, "self-probe finished");
    Ok(ok)
}
