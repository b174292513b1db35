//! Request ID middleware for the probe listener.
//!
//! Each probe request gets an `X-Request-ID`. The ID is:
//!
//! - Taken from the caller's `X-Request-ID` header when present and non-empty
//! - A fresh UUID v4 otherwise
//! - Stored as an axum [`Extension`](axum::Extension) for handlers
//! - Echoed back in the `X-Request-ID` response header
//! - Attached to a [`tracing`] span covering the handler
//!
//! Orchestrators rarely send an ID of their own, but a human debugging with
//! `curl -H 'X-Request-ID: ...'` can then find their probe in the logs.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{field, Instrument as _};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The ID assigned to the current request.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Axum middleware that assigns a [`RequestId`] to every request.
///
/// The span carries the probe path and, once answered, the status code, so a
/// run of 503s on `/readyz` can be followed request by request.
///
/// Apply it inside `tower_http::trace::TraceLayer` so it runs within the trace span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = caller_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::debug_span!(
        "probe_request",
        id = %id,
        method = %req.method(),
        path = %req.uri().path(),
        status = field::Empty,
    );
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).instrument(span.clone()).await;
    span.record("status", response.status().as_u16());
    span.in_scope(|| tracing::debug!(status = response.status().as_u16(), "probe answered"));

    if let Ok(header_value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), header_value);
    }

    response
}

/// A non-empty, header-safe `X-Request-ID` supplied by the caller.
fn caller_request_id(req: &Request) -> Option<String> {
    req.headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
