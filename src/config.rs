use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub const DEFAULT_STORE_FILE: &str = "servidores_status.json";

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LedgerConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl LedgerConfig {
    /// ~/.srvledger/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".srvledger").join("config.toml"))
    }

    /// Load config from disk (defaults if absent), then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_toml(&fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// SRVLEDGER_STORE / SRVLEDGER_HOST / SRVLEDGER_PORT win over the file.
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides<F>(mut self, get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = get("SRVLEDGER_STORE").filter(|s| !s.is_empty()) {
            self.store_path = PathBuf::from(store);
        }
        if let Some(host) = get("SRVLEDGER_HOST").filter(|s| !s.is_empty()) {
            self.host = host;
        }
        if let Some(port) = get("SRVLEDGER_PORT").filter(|s| !s.is_empty()) {
            self.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid SRVLEDGER_PORT: {}", port))?;
        }
        Ok(self)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path =
            Self::config_path().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(config_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
