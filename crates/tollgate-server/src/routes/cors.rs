//! CORS preflight responder.
//!
//! Answers every `OPTIONS` request, on any path, before routing or
//! authentication. The answer is fixed: the single configured origin,
//! any request header, credentials allowed, and the configured method list.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsSettings;
use crate::state::AppState;

/// Middleware that short-circuits `OPTIONS` with the preflight answer.
pub async fn preflight_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response(&state.config().cors);
    }
    next.run(request).await
}

/// Build the preflight answer.
pub fn preflight_response(cors: &CorsSettings) -> Response {
    let header = |value: &str| {
        HeaderValue::from_str(value).unwrap_or_else(|_| {
            tracing::warn!(value, "Invalid CORS header value in configuration");
            HeaderValue::from_static("")
        })
    };

    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, header(&cors.allowed_origin)),
            (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*")),
            (
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ),
            (ACCESS_CONTROL_ALLOW_METHODS, header(&cors.allow_methods)),
        ],
    )
        .into_response()
}
