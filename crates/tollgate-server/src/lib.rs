//! Authenticating reverse proxy for an OAuth2-protected REST API.
//!
//! Sits between a browser application and the upstream API (GitHub by
//! default). It runs the authorization-code exchange, keeps the resulting
//! token in an encrypted cookie, and forwards every other request upstream
//! with the token attached. No session state is kept on the server.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Behavior |
//! |---|---|---|---|
//! | OPTIONS | `/*` | no | CORS preflight |
//! | GET | `/login` | no | 302 to the provider's authorize page |
//! | GET | `/login-callback` | no | code exchange, session cookie, 302 |
//! | GET | `/is-auth` | no | JSON `true`/`false`, cookie presence only |
//! | GET/POST/PUT/DELETE/PATCH/HEAD | `/*` | yes | forwarded upstream |
//!
//! # Example
//!
//! ```ignore
//! use tollgate_server::{OAuthSettings, Server, ServerConfig, SessionSettings};
//!
//! let config = ServerConfig::new(
//!     OAuthSettings::github(client_id, client_secret).with_scopes("repo"),
//!     SessionSettings::new(aes_secret, aes_iv),
//! );
//!
//! Server::new(config)?.run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod routes;
pub mod state;

pub use auth::{AuthError, auth_middleware};
pub use config::{
    ClientRedirects, CorsSettings, OAuthSettings, ServerConfig, SessionSettings, UpstreamSettings,
};
pub use credential::{CredentialError, SessionCredential};
pub use crypto::{CookieCipher, CryptoError};
pub use error::{Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware,
    routing::{MethodRouter, get},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The tollgate HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server from configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            // Login flow (no session required for GET)
            .route("/login", self.public_get(routes::login))
            .route("/login-callback", self.public_get(routes::login_callback))
            .route("/is-auth", self.public_get(routes::is_auth))
            // Everything else goes through the auth gate to the upstream API
            .fallback_service(self.gateway_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            // Preflight is outermost so OPTIONS never reaches routing or auth
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                routes::preflight_middleware,
            ))
            .with_state(self.state.clone())
    }

    /// GET served locally; every other method on the same path, HEAD
    /// included, goes through the gateway like any other path.
    fn public_get<H, T>(&self, handler: H) -> MethodRouter<AppState>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        get(handler)
            .head_service(self.gateway_routes())
            .fallback_service(self.gateway_routes())
    }

    /// Catch-all forwarding behind the auth middleware.
    fn gateway_routes(&self) -> Router {
        Router::new()
            .fallback(routes::forward_handler)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::auth_middleware,
            ))
            .with_state(self.state.clone())
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the server, stopping gracefully when `shutdown` completes.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener (useful for tests picking port 0).
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;
        info!(addr = %local_addr, upstream = %self.state.config.upstream.api_url, "Starting server");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
