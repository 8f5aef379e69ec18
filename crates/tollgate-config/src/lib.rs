//! Configuration system for the tollgate proxy.
//!
//! Settings are layered, later sources overriding earlier ones:
//! - built-in defaults targeting GitHub
//! - a TOML file (`--config`, `~/.config/tollgate/tollgate.toml`, or `./tollgate.toml`)
//! - environment variables (`CLIENT_ID`, `AES_SECRET`, `TOLLGATE_*`, ...)
//!
//! CLI flags are applied by the binary on top of the result.
//! The loaded [`TollgateConfig`] must pass [`TollgateConfig::validate`] before
//! the server is started.

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, xdg_config_dir, xdg_config_path,
};
pub use env::{apply_env, apply_process_env};
pub use error::{ConfigError, Result};
pub use types::*;
