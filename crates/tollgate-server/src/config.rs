//! Server configuration.
//!
//! Built once at startup and shared read-only with every handler.

use std::net::SocketAddr;
use std::time::Duration;

use axum_extra::extract::cookie::SameSite;

/// Default max body size for forwarded requests (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default total timeout for an outbound call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout for an outbound call.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub OAuth authorize endpoint.
pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token endpoint.
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Identity provider settings.
#[derive(Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Passed verbatim as the `scope` query parameter.
    pub scopes: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl OAuthSettings {
    /// Settings for a GitHub OAuth app.
    pub fn github(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: String::new(),
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
        }
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

/// Upstream API settings.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub api_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: format!("tollgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session cookie settings and the raw key material for its cipher.
#[derive(Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secret: String,
    pub iv: String,
    /// Emit `Secure`. Off by default.
    pub secure: bool,
    /// Emit `SameSite` when set.
    pub same_site: Option<SameSite>,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("cookie_name", &self.cookie_name)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish_non_exhaustive()
    }
}

impl SessionSettings {
    pub fn new(secret: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            cookie_name: "GITHUB_TOKEN".to_string(),
            secret: secret.into(),
            iv: iv.into(),
            secure: false,
            same_site: None,
        }
    }
}

/// CORS preflight answer.
#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origin: String,
    /// Defaults to `GET,POST,PUT`, narrower than the methods forwarded.
    pub allow_methods: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:4200".to_string(),
            allow_methods: "GET,POST,PUT".to_string(),
        }
    }
}

/// Browser application pages the OAuth flow redirects to.
#[derive(Debug, Clone)]
pub struct ClientRedirects {
    pub base_url: String,
    pub login_path: String,
    pub landing_path: String,
}

impl Default for ClientRedirects {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4200".to_string(),
            login_path: "/login".to_string(),
            landing_path: "/select-repo".to_string(),
        }
    }
}

impl ClientRedirects {
    /// Login page, flagged as a cancelled attempt.
    pub fn canceled_login_url(&self) -> String {
        format!("{}?canceled=1", self.join(&self.login_path))
    }

    /// Page shown after a successful login.
    pub fn landing_url(&self) -> String {
        self.join(&self.landing_path)
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,

    pub oauth: OAuthSettings,
    pub upstream: UpstreamSettings,
    pub session: SessionSettings,
    pub cors: CorsSettings,
    pub client: ClientRedirects,
}

impl ServerConfig {
    /// Create a config with the two required groups; everything else defaults
    /// to the public GitHub endpoints.
    pub fn new(oauth: OAuthSettings, session: SessionSettings) -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().unwrap(),
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            oauth,
            upstream: UpstreamSettings::default(),
            session,
            cors: CorsSettings::default(),
            client: ClientRedirects::default(),
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn with_upstream(mut self, upstream: UpstreamSettings) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn with_cors(mut self, cors: CorsSettings) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_client(mut self, client: ClientRedirects) -> Self {
        self.client = client;
        self
    }
}
