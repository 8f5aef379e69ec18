//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::crypto::CookieCipher;
use crate::error::{Result, ServerError};

/// Application state shared across all handlers.
///
/// Everything here is immutable after construction; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Cipher for the session cookie.
    pub cipher: Arc<CookieCipher>,

    /// Pooled HTTP client for the token exchange and forwarded calls.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create the application state, building the cipher and HTTP client.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let cipher = CookieCipher::new(
            config.session.secret.as_bytes(),
            config.session.iv.as_bytes(),
        );

        let http = reqwest::Client::builder()
            .timeout(config.upstream.timeout)
            .connect_timeout(config.upstream.connect_timeout)
            .user_agent(config.upstream.user_agent.clone())
            .build()
            .map_err(|e| ServerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            cipher: Arc::new(cipher),
            http,
        })
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
