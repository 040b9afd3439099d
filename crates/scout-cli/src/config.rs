use anyhow::Context;
use scout_gateway::GatewayConfig;
use scout_search::SerperConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_PATH: &str = "scout.toml";

#[derive(Debug, Default, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SerperConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(flatten)]
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl ScoutConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] if it exists.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !tokio::fs::try_exists(&default).await.unwrap_or(false) {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.server.gateway.validate()?;
        Ok(config)
    }
}

/// Pick the listen port: `--port`, then `$PORT`, then the config file.
pub fn resolve_port(flag: Option<u16>, env: Option<String>, configured: u16) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a port number, got '{raw}'")),
        _ => Ok(configured),
    }
}
