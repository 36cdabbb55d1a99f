//! Config document loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::info;

use crate::defaults::apply_all_defaults;
use crate::env::{resolve_env_vars, resolve_env_vars_with};
use crate::schema::ScanConfig;

/// Default config file name, relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Read and parse the config document at `path`.
///
/// Unlike [`crate::load_and_prepare`], a missing or invalid file is an error.
pub async fn load_config(path: &Path) -> Result<ScanConfig> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config JSON at: {}", path.display()))?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config = into_config(value)?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse a config document from a string with an explicit env map.
pub fn parse_config(raw: &str, env: &HashMap<String, String>) -> Result<ScanConfig> {
    let value: Value = serde_json::from_str(raw).context("Failed to parse config JSON")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    into_config(value)
}

fn into_config(value: Value) -> Result<ScanConfig> {
    let config: ScanConfig =
        serde_json::from_value(value).context("Config does not match the expected schema")?;
    Ok(apply_all_defaults(config))
}
