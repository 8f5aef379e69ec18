//! Login flow endpoints: `/login`, `/login-callback`, `/is-auth`.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::Cookie,
};

use crate::auth::session_cookie_value;
use crate::config::SessionSettings;
use crate::credential::SessionCredential;
use crate::error::Result;
use crate::oauth;
use crate::state::AppState;

/// A `302 Found` redirect.
///
/// `axum::response::Redirect` only offers 303/307/308.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// GET /login
///
/// Redirects to the provider's authorize page. No local state is created.
pub async fn login(State(state): State<AppState>) -> Result<Response> {
    let url = oauth::build_authorization_url(&state.config().oauth)?;
    tracing::info!("Redirecting to identity provider");
    Ok(found(&url))
}

/// The `code` query parameter; when repeated, the last one counts.
pub fn callback_code(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .rev()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.as_str())
}

/// GET /login-callback
///
/// Exchanges `code` for an access token, stores the sealed credential in the
/// session cookie and sends the browser to the landing page. A missing or
/// empty `code` means the user backed out; they go back to the login page
/// with `canceled=1`.
pub async fn login_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<(CookieJar, Response)> {
    let config = state.config();

    let Some(code) = callback_code(&params).filter(|c| !c.is_empty()) else {
        tracing::warn!("Login cancelled: callback without code");
        return Ok((jar, found(&config.client.canceled_login_url())));
    };

    let access_token = oauth::exchange_code_for_token(&state.http, &config.oauth, code).await?;

    let sealed = SessionCredential::new(code, access_token).seal(&state.cipher);
    let jar = jar.add(session_cookie(&config.session, sealed));

    tracing::info!("Login completed, session cookie issued");
    Ok((jar, found(&config.client.landing_url())))
}

/// GET /is-auth
///
/// Presence check only: any non-empty session cookie counts, decryptable or
/// not. Protected calls do the real validation.
pub async fn is_auth(State(state): State<AppState>, jar: CookieJar) -> Json<bool> {
    Json(session_cookie_value(&jar, &state.config().session.cookie_name).is_some())
}

/// Build the session cookie. `HttpOnly` always; `Secure` and `SameSite` only
/// when configured.
pub(crate) fn session_cookie(settings: &SessionSettings, value: String) -> Cookie<'static> {
    let mut builder = Cookie::build((settings.cookie_name.clone(), value))
        .http_only(true)
        .path("/")
        .secure(settings.secure);

    if let Some(same_site) = settings.same_site {
        builder = builder.same_site(same_site);
    }

    builder.build()
}
