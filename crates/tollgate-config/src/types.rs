//! Configuration types.
//!
//! Every section is `#[serde(default)]`, so a config file only needs to
//! mention what it overrides. Secrets have no defaults and are checked by
//! [`TollgateConfig::validate`].

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, Result};

/// Placeholder written in place of secrets by [`TollgateConfig::redacted`].
pub const REDACTED: &str = "<redacted>";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COOKIE_NAME: &str = "GITHUB_TOKEN";
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:4200";
pub const DEFAULT_CORS_METHODS: &str = "GET,POST,PUT";

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    pub server: ServerSection,
    pub oauth: OAuthSection,
    pub upstream: UpstreamSection,
    pub session: SessionSection,
    pub cors: CorsSection,
    pub client: ClientSection,
}

impl TollgateConfig {
    /// Parse a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy of this config with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let hide = |value: &mut Option<String>| {
            if value.is_some() {
                *value = Some(REDACTED.to_string());
            }
        };
        hide(&mut copy.oauth.client_secret);
        hide(&mut copy.session.secret);
        hide(&mut copy.session.iv);
        copy
    }

    /// Parsed bind address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind", format!("{}", e)))
    }

    /// Check that everything needed to serve is present and well-formed.
    ///
    /// A failure here is fatal: the server must not start.
    pub fn validate(&self) -> Result<()> {
        require(&self.oauth.client_id, "oauth.client_id", "oauth", "CLIENT_ID")?;
        require(
            &self.oauth.client_secret,
            "oauth.client_secret",
            "oauth",
            "CLIENT_SECRET",
        )?;
        require(&self.session.secret, "session.secret", "session", "AES_SECRET")?;
        require(&self.session.iv, "session.iv", "session", "AES_IV")?;

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "session.cookie_name",
                "must not be empty",
            ));
        }

        self.bind_address()?;
        check_url(&self.oauth.authorize_url, "oauth.authorize_url")?;
        check_url(&self.oauth.token_url, "oauth.token_url")?;
        check_url(&self.upstream.api_url, "upstream.api_url")?;
        check_url(&self.cors.origin, "cors.origin")?;
        check_url(&self.client.url, "client.url")?;

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "upstream.timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.upstream.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "upstream.connect_timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn require(value: &Option<String>, field: &str, section: &str, env_var: &str) -> Result<()> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
            section: section.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

fn check_url(value: &str, field: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(field, format!("'{}' is not a valid URL: {}", value, e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Enable per-request logging.
    pub request_logging: bool,
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Scope string passed verbatim to the authorize endpoint.
    pub scopes: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            scopes: String::new(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSection {
    /// Base URL requests are forwarded to.
    pub api_url: String,
    /// Total timeout for an outbound call.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// User-Agent sent on outbound calls. GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: format!("tollgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `SameSite` attribute for the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl std::str::FromStr for SameSitePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSitePolicy::Strict),
            "lax" => Ok(SameSitePolicy::Lax),
            "none" => Ok(SameSitePolicy::None),
            other => Err(ConfigError::invalid(
                "session.same_site",
                format!("expected strict, lax or none, got '{}'", other),
            )),
        }
    }
}

/// Session cookie and credential encryption settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub cookie_name: String,
    /// AES-256 key material, used as raw bytes.
    pub secret: Option<String>,
    /// CBC initialization vector, used as raw bytes.
    pub iv: Option<String>,
    /// Add the `Secure` attribute to the cookie.
    pub secure: bool,
    pub same_site: Option<SameSitePolicy>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secret: None,
            iv: None,
            secure: false,
            same_site: None,
        }
    }
}

/// CORS preflight settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSection {
    /// The single origin allowed to call the proxy.
    pub origin: String,
    /// Value of `Access-Control-Allow-Methods`.
    pub allow_methods: String,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            origin: DEFAULT_CLIENT_URL.to_string(),
            allow_methods: DEFAULT_CORS_METHODS.to_string(),
        }
    }
}

/// Where the browser application lives, for post-login redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub url: String,
    pub login_path: String,
    pub landing_path: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_CLIENT_URL.to_string(),
            login_path: "/login".to_string(),
            landing_path: "/select-repo".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
