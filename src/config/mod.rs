// Configuration management for musiclist
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::library::DEFAULT_PLAYLIST;

pub const DEFAULT_TRANSPARENCY: u8 = 60;
pub const DEFAULT_SPEED: u8 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playlist_path: PathBuf,
    pub log_dir: PathBuf,
    pub other: OtherConfig,

    // where this config was read from; saves go back there
    #[serde(skip)]
    source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherConfig {
    pub textbox_transparency: u8, // 0-100
    pub textbox_speed: u8,        // 0-100
}

impl Default for Config {
    fn default() -> Self {
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("musiclist")
            .join("logs");

        Self {
            playlist_path: PathBuf::from(DEFAULT_PLAYLIST),
            log_dir,
            other: OtherConfig::default(),
            source: None,
        }
    }
}

impl Default for OtherConfig {
    fn default() -> Self {
        Self {
            textbox_transparency: DEFAULT_TRANSPARENCY,
            textbox_speed: DEFAULT_SPEED,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read config from `path`, writing defaults there first if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.source = Some(path.to_path_buf());
            debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config {
                source: Some(path.to_path_buf()),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        match &self.source {
            Some(path) => self.save_to(path),
            None => self.save_to(&Self::config_path()?),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!("Saved config to {}", path.display());

        Ok(())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("musiclist");

        Ok(config_dir.join("config.toml"))
    }
}
