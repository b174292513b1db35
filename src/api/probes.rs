//! Readiness and liveness probe endpoints.
//!
//! Handlers are thin: they take a snapshot from [`HealthState`] and render it.
//! Neither touches I/O or takes a lock, so a probe can never hang on work
//! elsewhere in the process.
//!
//! | Route | Success | Failure |
//! |---|---|---|
//! | readiness (`/readyz`) | 200 `healthy` | 503 `unhealthy` |
//! | liveness (`/livez`, `/healthz`) | 200 `alive` | never |

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{config::ProbeConfig, health::HealthState};

/// Conventional liveness path served in addition to the configured one.
pub const HEALTHZ_PATH: &str = "/healthz";

/// Build the probe router for the given state and paths.
///
/// All responses carry `Cache-Control: no-cache`.
pub fn router(state: Arc<HealthState>, probe: &ProbeConfig) -> Router {
    let mut router = Router::new()
        .route(&probe.readiness_path, get(readyz))
        .route(&probe.liveness_path, get(livez));

    if probe.liveness_path != HEALTHZ_PATH && probe.readiness_path != HEALTHZ_PATH {
        router = router.route(HEALTHZ_PATH, get(livez));
    }

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(state)
}

/// `GET /readyz` — 200 once caches are synced and controllers are ready, 503 before.
///
/// Example response while the caches are still syncing:
/// ```json
/// { "status": "unhealthy", "cachesSynced": false, "controllersReady": true }
/// ```
pub async fn readyz(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let snapshot = state.readiness();
    (snapshot.status_code(), Json(snapshot.body()))
}

/// `GET /livez` — always 200 with `"status": "alive"` and the raw flags.
pub async fn livez(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let snapshot = state.liveness();
    (snapshot.status_code(), Json(snapshot.body()))
}
