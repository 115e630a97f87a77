//! Config store for loading and saving capmatch.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{EngineConfig, parser};

pub const CONFIG_FILE_NAME: &str = "capmatch.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config dir>/capmatch/capmatch.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("capmatch");
        Ok(Self::from_path(dir.join(CONFIG_FILE_NAME)))
    }

    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<EngineConfig> {
        if !self.config_path.exists() {
            return Ok(EngineConfig::new());
        }
        parser::parse_config(&self.config_path)
    }

    /// Validate and write `config`, replacing the file in one rename.
    pub fn save(&self, config: &EngineConfig) -> anyhow::Result<()> {
        config.validate().context("Refusing to save invalid config")?;
        let content = parser::to_toml(config)?;

        let dir = self.config_path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let staging = self.config_path.with_extension("toml.tmp");
        std::fs::write(&staging, content)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        std::fs::rename(&staging, &self.config_path).with_context(|| {
            format!("Failed to replace config file: {}", self.config_path.display())
        })
    }
}
