// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Prefix for environment overrides, e.g. `SITE_MONITOR_CHECK__TIMEOUT_SECS=5`.
pub const ENV_PREFIX: &str = "SITE_MONITOR";

/// Load configuration from a file (YAML, JSON or TOML), layered with
/// `SITE_MONITOR_*` environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_with_env(path.as_ref(), None)
}

/// `env` replaces the process environment when set.
fn load_with_env(path: &Path, env: Option<::config::Map<String, String>>) -> Result<Config> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse config")?;

    config.validate()?;
    Ok(config)
}

/// Render a configuration back to YAML.
pub fn to_yaml(config: &Config) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize config")
}
