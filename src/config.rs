use crate::capture::{CardTheme, RenderOptions};
use crate::lang::Language;
use crate::lookup::DEFAULT_ENDPOINT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_SCALE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub log_level: String,
    pub lookup: LookupConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Defaults to the user's download directory.
    pub directory: Option<PathBuf>,
    pub scale: u32,
    pub theme: CardTheme,
    pub open_after_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::Tr,
            log_level: "info".to_string(),
            lookup: LookupConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            scale: 2,
            theme: CardTheme::Light,
            open_after_export: false,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tweetcard").join("config.toml"))
    }

    /// Load from an explicit path (which must exist) or from the default
    /// location when present; otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.export.scale = config.export.scale.clamp(1, MAX_SCALE);
        if config.lookup.timeout_secs == 0 {
            anyhow::bail!("lookup.timeout_secs must be greater than zero");
        }
        Ok(config)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.export.scale,
            theme: self.export.theme,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_secs)
    }
}
