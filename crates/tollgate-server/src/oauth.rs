//! OAuth 2.0 authorization-code exchange with the identity provider.
//!
//! The token request goes out as JSON, but the provider answers this
//! particular call with `application/x-www-form-urlencoded` pairs
//! (`access_token=...&scope=...&token_type=bearer`), so the response is
//! decoded as a form body, never as JSON.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::config::OAuthSettings;
use crate::error::{Result, ServerError};

/// Build the provider's authorize URL carrying `scope` and `client_id`.
pub fn build_authorization_url(settings: &OAuthSettings) -> Result<String> {
    let mut url = Url::parse(&settings.authorize_url).map_err(|e| {
        ServerError::Config(format!(
            "Invalid authorize URL '{}': {}",
            settings.authorize_url, e
        ))
    })?;

    url.query_pairs_mut()
        .append_pair("scope", &settings.scopes)
        .append_pair("client_id", &settings.client_id);

    Ok(url.into())
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Exchange an authorization code for an access token.
///
/// Any provider status of 300 or above, or a response without a non-empty
/// `access_token`, is a [`ServerError::TokenExchange`]. Nothing is retried.
pub async fn exchange_code_for_token(
    http: &reqwest::Client,
    settings: &OAuthSettings,
    code: &str,
) -> Result<String> {
    let request_body = TokenExchangeRequest {
        client_id: &settings.client_id,
        client_secret: &settings.client_secret,
        code,
    };

    let response = http
        .post(&settings.token_url)
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await
        .map_err(|e| ServerError::TokenExchange(format!("request failed: {}", e)))?;

    let status = response.status();
    if status.as_u16() >= 300 {
        return Err(ServerError::TokenExchange(format!(
            "provider responded with {}",
            status
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ServerError::TokenExchange(format!("failed to read response: {}", e)))?;

    let fields = parse_token_response(&body);
    match fields.get("access_token") {
        Some(token) if !token.is_empty() => Ok(token.clone()),
        _ => {
            // GitHub reports bad codes as `error=bad_verification_code` with a 200.
            let reason = fields
                .get("error")
                .map(String::as_str)
                .unwrap_or("no access_token in response");
            Err(ServerError::TokenExchange(reason.to_string()))
        }
    }
}

/// Decode an `&`-joined list of URL-encoded `key=value` pairs.
///
/// A repeated key keeps its last value.
pub fn parse_token_response(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}
