//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, redirect};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::MockServer;

use tollgate_server::{
    CookieCipher, OAuthSettings, Server, ServerConfig, SessionCredential, SessionSettings,
    UpstreamSettings,
};

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_IV: &str = "abcdef9876543210";
pub const TOKEN_PATH: &str = "/login/oauth/access_token";

/// A proxy running in the background in front of a mock provider/API.
pub struct TestGateway {
    /// The proxy's address.
    pub addr: SocketAddr,
    /// Client that does not follow redirects.
    pub client: Client,
    /// Mock standing in for both the token endpoint and the upstream API.
    pub upstream: MockServer,
    /// Cipher matching the proxy's key material.
    pub cipher: CookieCipher,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a proxy with default settings.
    pub async fn start() -> Result<Self> {
        Self::start_with(|config| config).await
    }

    /// Start a proxy, letting the caller adjust the config first.
    pub async fn start_with(customize: impl FnOnce(ServerConfig) -> ServerConfig) -> Result<Self> {
        let upstream = MockServer::start().await;

        let oauth = OAuthSettings::github("test-client", "test-secret")
            .with_scopes("repo")
            .with_token_url(format!("{}{}", upstream.uri(), TOKEN_PATH));
        let upstream_settings = UpstreamSettings {
            api_url: upstream.uri(),
            ..UpstreamSettings::default()
        };
        let config = ServerConfig::new(oauth, SessionSettings::new(TEST_SECRET, TEST_IV))
            .with_upstream(upstream_settings)
            .with_request_logging(false);

        let server = Server::new(customize(config))?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener, std::future::pending()).await;
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            upstream,
            cipher: CookieCipher::new(TEST_SECRET.as_bytes(), TEST_IV.as_bytes()),
            _handle: handle,
        })
    }

    /// Get the base URL for the proxy.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request builder without a session.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url(), path))
    }

    /// Request builder carrying a session cookie for `access_token`.
    pub fn authed(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        let sealed = SessionCredential::new("test-code", access_token).seal(&self.cipher);
        self.request(method, path)
            .header("Cookie", format!("GITHUB_TOKEN={}", sealed))
    }
}
