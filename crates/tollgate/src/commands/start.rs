//! Start command - launches the proxy server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use axum_extra::extract::cookie::SameSite;
use clap::Args;
use tracing::info;

use tollgate_config::{SameSitePolicy, TollgateConfig};
use tollgate_server::{
    ClientRedirects, CorsSettings, OAuthSettings, Server, ServerConfig, SessionSettings,
    UpstreamSettings,
};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Path to config file (overrides default discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to, e.g. 0.0.0.0:8080 (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = tollgate_config::load_config(args.config.as_deref())?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Loaded config file"),
        None => info!("No config file found, using defaults and environment"),
    }

    let mut config = loaded.config;
    apply_overrides(&mut config, &args)?;
    config.validate().context("invalid configuration")?;

    if ctx.verbose {
        info!(config = ?config.redacted(), "Resolved configuration");
    }

    // ── Start server ────────────────────────────────────────────────────

    let server = Server::new(server_config(&config)?)?;
    info!(addr = %server.bind_address(), "Tollgate starting");

    server.run_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Apply `--bind` and `--port` on top of the loaded configuration.
fn apply_overrides(config: &mut TollgateConfig, args: &StartArgs) -> Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }

    if let Some(port) = args.port {
        let mut addr: SocketAddr = config
            .bind_address()
            .context("cannot apply --port to the configured bind address")?;
        addr.set_port(port);
        config.server.bind = addr.to_string();
    }

    Ok(())
}

/// Map a validated file/env configuration onto the server's settings.
fn server_config(config: &TollgateConfig) -> Result<ServerConfig> {
    let oauth = OAuthSettings::github(
        config.oauth.client_id.clone().unwrap_or_default(),
        config.oauth.client_secret.clone().unwrap_or_default(),
    )
    .with_scopes(config.oauth.scopes.clone())
    .with_authorize_url(config.oauth.authorize_url.clone())
    .with_token_url(config.oauth.token_url.clone());

    let mut session = SessionSettings::new(
        config.session.secret.clone().unwrap_or_default(),
        config.session.iv.clone().unwrap_or_default(),
    );
    session.cookie_name = config.session.cookie_name.clone();
    session.secure = config.session.secure;
    session.same_site = config.session.same_site.map(same_site);

    let upstream = UpstreamSettings {
        api_url: config.upstream.api_url.clone(),
        timeout: Duration::from_secs(config.upstream.timeout_secs),
        connect_timeout: Duration::from_secs(config.upstream.connect_timeout_secs),
        user_agent: config.upstream.user_agent.clone(),
    };

    let cors = CorsSettings {
        allowed_origin: config.cors.origin.clone(),
        allow_methods: config.cors.allow_methods.clone(),
    };

    let client = ClientRedirects {
        base_url: config.client.url.clone(),
        login_path: config.client.login_path.clone(),
        landing_path: config.client.landing_path.clone(),
    };

    Ok(ServerConfig::new(oauth, session)
        .with_bind_address(config.bind_address()?)
        .with_request_logging(config.server.request_logging)
        .with_max_body_size(config.server.max_body_size)
        .with_upstream(upstream)
        .with_cors(cors)
        .with_client(client))
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> TollgateConfig {
        let mut config = TollgateConfig::default();
        config.oauth.client_id = Some("client".to_string());
        config.oauth.client_secret = Some("shh".to_string());
        config.oauth.scopes = "repo".to_string();
        config.session.secret = Some("0123456789abcdef0123456789abcdef".to_string());
        config.session.iv = Some("abcdef9876543210".to_string());
        config
    }

    #[test]
    fn test_bind_override() {
        let mut config = complete();
        let args = StartArgs {
            bind: Some("0.0.0.0:9000".to_string()),
            ..Default::default()
        };
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_port_override_keeps_host() {
        let mut config = complete();
        let args = StartArgs {
            port: Some(3000),
            ..Default::default()
        };
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_port_override_on_bad_bind() {
        let mut config = complete();
        config.server.bind = "not-an-address".to_string();
        let args = StartArgs {
            port: Some(3000),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }

    #[test]
    fn test_server_config_mapping() {
        let mut config = complete();
        config.session.secure = true;
        config.session.same_site = Some(SameSitePolicy::Lax);
        config.upstream.timeout_secs = 5;
        config.cors.allow_methods = "GET,POST,PUT,DELETE".to_string();
        config.client.url = "https://app.example.com".to_string();

        let server = server_config(&config).unwrap();

        assert_eq!(server.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(server.oauth.client_id, "client");
        assert_eq!(server.oauth.scopes, "repo");
        assert_eq!(
            server.oauth.token_url,
            "https://github.com/login/oauth/access_token"
        );
        assert_eq!(server.session.cookie_name, "GITHUB_TOKEN");
        assert!(server.session.secure);
        assert_eq!(server.session.same_site, Some(SameSite::Lax));
        assert_eq!(server.upstream.timeout, Duration::from_secs(5));
        assert_eq!(server.cors.allow_methods, "GET,POST,PUT,DELETE");
        assert_eq!(
            server.client.landing_url(),
            "https://app.example.com/select-repo"
        );
    }

    #[test]
    fn test_server_config_defaults_have_no_same_site() {
        let server = server_config(&complete()).unwrap();
        assert!(!server.session.secure);
        assert_eq!(server.session.same_site, None);
        assert_eq!(server.cors.allowed_origin, "http://localhost:4200");
    }
}
