//! Config store for loading and saving config.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{ClientConfig, parser};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config_dir>/dcctl/config.toml`.
    pub fn from_default_dir() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("dcctl");
        Ok(Self::from_dir(&dir))
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self::from_path(dir.join(CONFIG_FILE))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// File contents only. A missing file is an empty config.
    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        if !self.config_path.exists() {
            return Ok(ClientConfig::default());
        }
        parser::parse_client_toml(&self.config_path)
    }

    pub fn save(&self, config: &ClientConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
