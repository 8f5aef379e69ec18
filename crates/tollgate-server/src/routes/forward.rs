//! Forwarding gateway.
//!
//! Turns an authenticated client request into an upstream API call with the
//! session's bearer token and relays status, body and headers back.
//!
//! Headers are filtered explicitly in both directions:
//! - inbound → upstream: only [`FORWARDED_REQUEST_HEADERS`] plus `Authorization`
//! - upstream → client: everything except [`RESPONSE_HEADER_DENY_LIST`]

use axum::{
    Extension,
    body::{Body, Bytes},
    extract::State,
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, Uri,
        header::{AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH},
    },
    response::Response,
};

use crate::credential::SessionCredential;
use crate::error::{Result, ServerError};
use crate::logging::UpstreamTarget;
use crate::state::AppState;

/// Paths ending here are repository "contents" listings.
pub const CONTENTS_SUFFIX: &str = "contents/";

/// Appended to a contents path: the per-repository test input file.
pub const USER_INPUT_FILE: &str = ".xd-testing/UserInput.json";

/// Methods the gateway forwards.
pub const FORWARDED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
];

/// Inbound headers copied onto the upstream request when present.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 2] = [CONTENT_TYPE, IF_NONE_MATCH];

/// Upstream response headers never relayed to the client.
pub const RESPONSE_HEADER_DENY_LIST: [&str; 2] = ["server", "content-encoding"];

/// Strip the leading `/` and apply the contents-file rewrite.
pub fn rewrite_path(path: &str) -> String {
    let mut path = path.strip_prefix('/').unwrap_or(path).to_string();
    if path.ends_with(CONTENTS_SUFFIX) {
        path.push_str(USER_INPUT_FILE);
    }
    path
}

/// `<api_url>/<path>` plus `?<query>` when the query is non-empty.
pub fn upstream_url(api_url: &str, path: &str, query: Option<&str>) -> String {
    let base = api_url.trim_end_matches('/');
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}/{}?{}", base, path, q),
        None => format!("{}/{}", base, path),
    }
}

/// Headers for the upstream request.
pub fn forwarded_headers(inbound: &HeaderMap, access_token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for name in &FORWARDED_REQUEST_HEADERS {
        for value in inbound.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|_| {
        ServerError::Unauthorized("access token is not a valid header value".to_string())
    })?;
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}

/// Upstream response headers minus the deny list.
pub fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !RESPONSE_HEADER_DENY_LIST.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Catch-all handler behind the auth middleware.
///
/// Upstream answers of any status, 401/403/304 included, are passed through
/// as-is. Only transport failures produce a gateway error.
pub async fn forward_handler(
    State(state): State<AppState>,
    Extension(credential): Extension<SessionCredential>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    if !FORWARDED_METHODS.contains(&method) {
        return Err(ServerError::MethodNotAllowed(method.to_string()));
    }

    let path = rewrite_path(uri.path());
    let url = upstream_url(&state.config().upstream.api_url, &path, uri.query());
    let outbound_headers = forwarded_headers(&headers, credential.access_token())?;

    tracing::debug!(method = %method, path = %path, "Forwarding request upstream");

    let mut request = state
        .http
        .request(method.clone(), &url)
        .headers(outbound_headers);
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(|e| transport_error(&method, &path, e))?;

    let status = upstream.status();
    let upstream_headers = relayed_headers(upstream.headers());
    let upstream_body = upstream
        .bytes()
        .await
        .map_err(|e| transport_error(&method, &path, e))?;

    let mut response = Response::new(Body::from(upstream_body));
    *response.status_mut() = status;
    *response.headers_mut() = upstream_headers;
    response.extensions_mut().insert(UpstreamTarget(path));

    Ok(response)
}

fn transport_error(method: &Method, path: &str, e: reqwest::Error) -> ServerError {
    let detail = format!("{} {}: {}", method, path, e);
    if e.is_timeout() {
        ServerError::UpstreamTimeout(detail)
    } else {
        ServerError::Upstream(detail)
    }
}
