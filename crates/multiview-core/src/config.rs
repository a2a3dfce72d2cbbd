//! Configuration management for multiview
//!
//! Handles loading and validation of `multiview.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MULTIVIEW_CONFIG";

/// Default layout document file name inside the module directory.
pub const DEFAULT_LAYOUT_FILE: &str = "layout.json";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Layout document storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Where and how the layout document is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the directory supplied by the host
    pub directory: Option<PathBuf>,

    /// File name of the layout document inside the directory
    pub file_name: String,

    /// Pretty-print the JSON document
    pub pretty: bool,

    /// Keep a `.corrupt` copy of a document that fails to parse
    pub backup_corrupt: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: DEFAULT_LAYOUT_FILE.to_string(),
            pretty: true,
            backup_corrupt: true,
        }
    }
}

impl StorageConfig {
    /// Full path to the layout document given the host's module directory.
    #[must_use]
    pub fn layout_path(&self, module_dir: &Path) -> PathBuf {
        self.directory
            .as_deref()
            .unwrap_or(module_dir)
            .join(&self.file_name)
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// A missing default file yields defaults; an explicit path set through
    /// [`CONFIG_ENV_VAR`] must exist.
    pub fn load() -> crate::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.display().to_string(), e.to_string()))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeFailed(e.to_string()).into())
    }

    pub fn validate(&self) -> crate::Result<()> {
        let name = self.storage.file_name.trim();
        if name.is_empty() {
            return Err(
                ConfigError::ValidationError("storage.file_name is empty".to_string()).into(),
            );
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(ConfigError::ValidationError(format!(
                "storage.file_name must be a bare file name, got '{name}'"
            ))
            .into());
        }
        Ok(())
    }
}

/// `<config dir>/multiview/multiview.toml`, when a config dir is known.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("multiview").join("multiview.toml"))
}

/// Per-module writable directory used when the host does not supply one:
/// `<config dir>/multiview`, else `$HOME/.config/multiview`.
pub fn default_module_dir() -> crate::Result<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|dir| dir.join("multiview"))
        .ok_or_else(|| {
            ConfigError::ValidationError(
                "no config or home directory; set storage.directory".to_string(),
            )
            .into()
        })
}
