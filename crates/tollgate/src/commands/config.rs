//! Config command - configuration inspection.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to config file (overrides default discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `show`
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration with secrets redacted
    Show,

    /// Show the user configuration file path
    Path,

    /// Write a commented config file template
    Init {
        /// Create ./tollgate.toml instead of the user config file
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => cmd_show(args.config, ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

/// Print the merged config; fails when it would not start a server.
fn cmd_show(path: Option<PathBuf>, ctx: &Context) -> Result<()> {
    let loaded = tollgate_config::load_config(path.as_deref())?;

    match &loaded.source {
        Some(source) => println!("# Loaded from {}", source.display()),
        None => println!("# No config file found (defaults and environment only)"),
    }
    if ctx.verbose
        && let Some(user_path) = tollgate_config::xdg_config_path()
    {
        println!("# User config path: {}", user_path.display());
    }
    println!();
    println!("{}", loaded.config.redacted().to_toml()?);

    if let Err(e) = loaded.config.validate() {
        anyhow::bail!("configuration is not valid: {}", e);
    }

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = tollgate_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("tollgate.toml")
    } else {
        let dir = tollgate_config::xdg_config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("tollgate.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, TEMPLATE)?;
    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  tollgate keygen >> .env    # generate AES_SECRET and AES_IV");
    println!("  tollgate config show       # verify configuration");

    Ok(())
}

const TEMPLATE: &str = r#"# Tollgate Configuration
#
# Secrets are best left to the environment:
#   CLIENT_ID, CLIENT_SECRET, AES_SECRET, AES_IV

[server]
bind = "127.0.0.1:8080"
request_logging = true

[oauth]
scopes = "repo"
# authorize_url = "https://github.com/login/oauth/authorize"
# token_url = "https://github.com/login/oauth/access_token"

[upstream]
# api_url = "https://api.github.com"
timeout_secs = 30

[session]
cookie_name = "GITHUB_TOKEN"
# secure = true
# same_site = "lax"

[cors]
origin = "http://localhost:4200"
allow_methods = "GET,POST,PUT"

[client]
url = "http://localhost:4200"
login_path = "/login"
landing_path = "/select-repo"
"#;
