// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = if path.extension().and_then(|s| s.to_str()) == Some("yaml")
        || path.extension().and_then(|s| s.to_str()) == Some("yml") {
        serde_yaml::from_str(&contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(&contents).context("Failed to parse JSON config")?
    };

    Ok(config)
}

/// Build the startup configuration: defaults, then the optional file, then
/// command-line overrides. The result is validated before it is returned.
pub async fn resolve_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Config> {
    let base = match path {
        Some(path) => load_config(path).await?,
        None => Config::default(),
    };

    let config = base.with_overrides(overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
