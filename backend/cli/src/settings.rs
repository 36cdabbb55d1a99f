use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use listscan_config::CONFIG_FILE_NAME;
use listscan_core::VisionModel;
use listscan_vision::{OpenAiCompatProvider, DASHSCOPE_BASE_URL};
use serde::Serialize;

/// listscan process settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Recognition config document
    pub config_path: PathBuf,
    /// Static browser client
    pub public_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// DashScope API key
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint base
    pub api_base: String,
    /// Gate token; unset disables the gate
    pub access_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            config_path: PathBuf::from(CONFIG_FILE_NAME),
            public_dir: PathBuf::from("public"),
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
            api_key: None,
            api_base: DASHSCOPE_BASE_URL.to_string(),
            access_token: None,
        }
    }
}

impl ServerSettings {
    /// Load settings from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            bind_address: var("LISTSCAN_BIND").unwrap_or(defaults.bind_address),
            port: var("LISTSCAN_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            config_path: var("LISTSCAN_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            public_dir: var("LISTSCAN_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            log_dir: var("LISTSCAN_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            api_key: var("DASHSCOPE_API_KEY"),
            api_base: var("LISTSCAN_API_BASE").unwrap_or(defaults.api_base),
            access_token: var("ACCESS_TOKEN"),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_address, self.port))
    }

    /// The model client, or `None` without an API key.
    pub fn vision_model(&self) -> Option<Arc<dyn VisionModel>> {
        let api_key = self.api_key.as_deref()?;
        let provider = OpenAiCompatProvider::new(api_key).with_base_url(&self.api_base);
        let model: Arc<dyn VisionModel> = Arc::new(provider);
        Some(model)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> ServerSettings {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerSettings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let s = settings(&[]);
        assert_eq!(s.port, 8080);
        assert_eq!(s.config_path, PathBuf::from("config.json"));
        assert_eq!(s.api_base, DASHSCOPE_BASE_URL);
        assert!(s.api_key.is_none());
        assert!(s.vision_model().is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("LISTSCAN_PORT", "9090"),
            ("LISTSCAN_BIND", "127.0.0.1"),
            ("DASHSCOPE_API_KEY", "sk-test"),
            ("ACCESS_TOKEN", "gate"),
        ]);
        assert_eq!(s.socket_addr().unwrap().to_string(), "127.0.0.1:9090");
        assert_eq!(s.access_token.as_deref(), Some("gate"));
        assert!(s.vision_model().is_some());
    }

    #[test]
    fn blank_values_are_unset() {
        let s = settings(&[("ACCESS_TOKEN", ""), ("LISTSCAN_PORT", "not-a-port")]);
        assert!(s.access_token.is_none());
        assert_eq!(s.port, 8080);
    }
}
