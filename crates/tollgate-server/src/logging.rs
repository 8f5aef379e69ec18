//! Structured request logging middleware.
//!
//! One line per request. Forwarded calls also carry the upstream path they
//! were sent to, which differs from the inbound path after the contents
//! rewrite. Query strings are never logged: on `/login-callback` they carry
//! the authorization code.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Response extension set by the gateway: the upstream path that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget(pub String);

/// Logs method, path, status, duration and upstream target per request.
///
/// Level follows the status class. A no-op when request logging is disabled.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let upstream = response
        .extensions()
        .get::<UpstreamTarget>()
        .map(|t| t.0.as_str())
        .unwrap_or("-");
    let status = response.status();
    let duration_ms = start.elapsed().as_millis();

    match Outcome::of(status) {
        Outcome::ServerError => tracing::error!(
            %method, %path, upstream, status = status.as_u16(), duration_ms,
            "Request failed"
        ),
        Outcome::Rejected => tracing::warn!(
            %method, %path, upstream, status = status.as_u16(), duration_ms,
            "Request rejected"
        ),
        Outcome::Ok => tracing::info!(
            %method, %path, upstream, status = status.as_u16(), duration_ms,
            "Request completed"
        ),
    }

    response
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    ServerError,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Outcome::ServerError
        } else if status.is_client_error() {
            Outcome::Rejected
        } else {
            Outcome::Ok
        }
    }
}
