//! Environment variable overrides.
//!
//! The OAuth client and cookie key settings use bare names (`CLIENT_ID`,
//! `AES_SECRET`, ...) so plain `.env` files work. Everything else is under the
//! `TOLLGATE_` prefix. Empty variables are treated as unset.

use crate::error::{ConfigError, Result};
use crate::types::{SameSitePolicy, TollgateConfig};

pub const CLIENT_ID_ENV: &str = "CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "CLIENT_SECRET";
pub const SCOPES_ENV: &str = "GITHUB_SCOPES";
pub const AES_SECRET_ENV: &str = "AES_SECRET";
pub const AES_IV_ENV: &str = "AES_IV";

pub const BIND_ENV: &str = "TOLLGATE_BIND";
pub const CORS_ORIGIN_ENV: &str = "TOLLGATE_CORS_ORIGIN";
pub const CLIENT_URL_ENV: &str = "TOLLGATE_CLIENT_URL";
pub const API_URL_ENV: &str = "TOLLGATE_API_URL";
pub const AUTHORIZE_URL_ENV: &str = "TOLLGATE_AUTHORIZE_URL";
pub const TOKEN_URL_ENV: &str = "TOLLGATE_TOKEN_URL";
pub const COOKIE_NAME_ENV: &str = "TOLLGATE_COOKIE_NAME";
pub const COOKIE_SECURE_ENV: &str = "TOLLGATE_COOKIE_SECURE";
pub const COOKIE_SAME_SITE_ENV: &str = "TOLLGATE_COOKIE_SAME_SITE";
pub const UPSTREAM_TIMEOUT_ENV: &str = "TOLLGATE_UPSTREAM_TIMEOUT_SECS";

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut TollgateConfig) -> Result<()> {
    apply_env(config, |name| std::env::var(name).ok())
}

/// Apply overrides using `lookup` to read variables.
///
/// Taking the lookup as a parameter keeps tests away from process-global state.
pub fn apply_env<F>(config: &mut TollgateConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = get(CLIENT_ID_ENV) {
        config.oauth.client_id = Some(v);
    }
    if let Some(v) = get(CLIENT_SECRET_ENV) {
        config.oauth.client_secret = Some(v);
    }
    if let Some(v) = get(SCOPES_ENV) {
        config.oauth.scopes = v;
    }
    if let Some(v) = get(AES_SECRET_ENV) {
        config.session.secret = Some(v);
    }
    if let Some(v) = get(AES_IV_ENV) {
        config.session.iv = Some(v);
    }

    if let Some(v) = get(BIND_ENV) {
        config.server.bind = v;
    }
    if let Some(v) = get(CORS_ORIGIN_ENV) {
        config.cors.origin = v;
    }
    if let Some(v) = get(CLIENT_URL_ENV) {
        config.client.url = v;
    }
    if let Some(v) = get(API_URL_ENV) {
        config.upstream.api_url = v;
    }
    if let Some(v) = get(AUTHORIZE_URL_ENV) {
        config.oauth.authorize_url = v;
    }
    if let Some(v) = get(TOKEN_URL_ENV) {
        config.oauth.token_url = v;
    }
    if let Some(v) = get(COOKIE_NAME_ENV) {
        config.session.cookie_name = v;
    }
    if let Some(v) = get(COOKIE_SECURE_ENV) {
        config.session.secure = parse_bool(COOKIE_SECURE_ENV, &v)?;
    }
    if let Some(v) = get(COOKIE_SAME_SITE_ENV) {
        config.session.same_site = Some(v.parse::<SameSitePolicy>()?);
    }
    if let Some(v) = get(UPSTREAM_TIMEOUT_ENV) {
        config.upstream.timeout_secs = v.parse().map_err(|_| ConfigError::Invalid {
            field: UPSTREAM_TIMEOUT_ENV.to_string(),
            reason: format!("'{}' is not a number of seconds", v),
        })?;
    }

    Ok(())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            field: name.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}
