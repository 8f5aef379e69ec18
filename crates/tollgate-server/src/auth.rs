//! Session authentication.
//!
//! The gate in front of every forwarded call. A request passes only when its
//! session cookie decrypts and splits into a three-field credential. Absent,
//! undecryptable and malformed cookies all produce the same 401, so a caller
//! cannot tell which check failed.
//!
//! No expiry or revocation check happens here. The upstream API is the judge
//! of token validity, and its 401/403 answers are relayed unchanged.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::credential::{CredentialError, SessionCredential};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No session cookie, or an empty one.
    #[error("Missing session credential")]
    MissingCredential,
    /// Cookie present but not a credential minted with this key.
    #[error("Invalid session credential: {0}")]
    InvalidCredential(#[source] CredentialError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Unauthorized",
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cookie helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Raw value of the session cookie, if present and non-empty.
pub fn session_cookie_value(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate the session cookie in `headers` and return the credential.
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<SessionCredential, AuthError> {
    let jar = CookieJar::from_headers(headers);
    let value = session_cookie_value(&jar, &state.config().session.cookie_name)
        .ok_or(AuthError::MissingCredential)?;

    SessionCredential::open(&value, &state.cipher).map_err(AuthError::InvalidCredential)
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication middleware function.
///
/// Inserts the [`SessionCredential`] into request extensions for the
/// forwarding handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let credential = authenticate(request.headers(), &state).inspect_err(|e| {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            reason = %e,
            "Rejected request without a valid session"
        );
    })?;

    request.extensions_mut().insert(credential);

    Ok(next.run(request).await)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OAuthSettings, ServerConfig, SessionSettings};
    use axum::{Extension, Router, middleware, routing::get};
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ServerConfig::new(
            OAuthSettings::github("client-id", "client-secret"),
            SessionSettings::new("0123456789abcdef0123456789abcdef", "abcdef9876543210"),
        );
        AppState::new(config).unwrap()
    }

    async fn protected_handler(Extension(credential): Extension<SessionCredential>) -> String {
        credential.access_token().to_string()
    }

    fn create_test_router(state: AppState) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state)
    }

    async fn call(app: Router, cookie: Option<&str>) -> Response {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_credential_passes_token() {
        let state = create_test_state();
        let sealed = SessionCredential::new("code-1", "gho_abc").seal(&state.cipher);
        let app = create_test_router(state);

        let response = call(app, Some(&format!("GITHUB_TOKEN={}", sealed))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"gho_abc");
    }

    #[tokio::test]
    async fn test_missing_cookie() {
        let app = create_test_router(create_test_state());
        let response = call(app, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_cookie() {
        let app = create_test_router(create_test_state());
        let response = call(app, Some("GITHUB_TOKEN=")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_cookie_only() {
        let app = create_test_router(create_test_state());
        let response = call(app, Some("theme=dark")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_cookie_values_rejected() {
        let state = create_test_state();
        let other_key = crate::crypto::CookieCipher::new(b"another-key", b"another-iv");
        let foreign = SessionCredential::new("code", "token").seal(&other_key);
        let two_fields = state.cipher.encrypt("code*|*token");

        for value in ["garbage", "Zm9vYmFy", foreign.as_str(), two_fields.as_str()] {
            let app = create_test_router(state.clone());
            let response = call(app, Some(&format!("GITHUB_TOKEN={}", value))).await;
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "cookie value {value:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_rejections_are_indistinguishable() {
        let state = create_test_state();

        let missing = call(create_test_router(state.clone()), None).await;
        let garbage = call(create_test_router(state), Some("GITHUB_TOKEN=garbage")).await;

        let missing_body = axum::body::to_bytes(missing.into_body(), usize::MAX)
            .await
            .unwrap();
        let garbage_body = axum::body::to_bytes(garbage.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(missing_body, garbage_body);
    }

    #[test]
    fn test_auth_error_display() {
        use std::error::Error;

        assert_eq!(
            AuthError::MissingCredential.to_string(),
            "Missing session credential"
        );

        let err = AuthError::InvalidCredential(CredentialError::Malformed(2));
        assert_eq!(
            err.to_string(),
            "Invalid session credential: credential has 2 fields, expected 3"
        );
        assert!(err.source().is_some());
        assert!(AuthError::MissingCredential.source().is_none());
    }

    #[test]
    fn test_session_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "a=1; GITHUB_TOKEN=xyz".parse().unwrap());
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(
            session_cookie_value(&jar, "GITHUB_TOKEN"),
            Some("xyz".to_string())
        );
        assert_eq!(session_cookie_value(&jar, "OTHER"), None);
    }
}
