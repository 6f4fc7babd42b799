//! Configuration loading and management
//!
//! Handles parsing of `.sprintboard.toml` files. Without a usable file at the
//! board root, loading falls back to the user-level file found in the
//! platform config directory. The two files are never merged.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::model::Priority;

/// Config file name at a board root
pub const CONFIG_FILE: &str = ".sprintboard.toml";

/// Colors cycled through when a label is created without one
pub const DEFAULT_LABEL_COLORS: [&str; 9] = [
    "#ef4444", // red
    "#f59e0b", // orange
    "#eab308", // yellow
    "#22c55e", // green
    "#06b6d4", // cyan
    "#3b82f6", // blue
    "#8b5cf6", // purple
    "#ec4899", // pink
    "#6b7280", // gray
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project used when the CLI is not given `--project`
    #[serde(default = "default_project")]
    pub default_project: String,

    #[serde(default)]
    pub tasks: TasksConfig,

    #[serde(default)]
    pub labels: LabelsConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_project: default_project(),
            tasks: TasksConfig::default(),
            labels: LabelsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

fn default_project() -> String {
    "default".to_string()
}

/// Task store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Prefix for issue keys (`<PREFIX>-<n>`); derived from the project id when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,

    /// Priority given to tasks created without one
    #[serde(default)]
    pub default_priority: Priority,

    /// Reset status to `backlog` when a task leaves its sprint
    #[serde(default)]
    pub reset_status_on_backlog: bool,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            key_prefix: None,
            default_priority: Priority::Medium,
            reset_status_on_backlog: false,
        }
    }
}

/// Label registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    /// Palette cycled by insertion index for labels created without a color
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

fn default_palette() -> Vec<String> {
    DEFAULT_LABEL_COLORS.iter().map(|c| c.to_string()).collect()
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
        }
    }
}

/// File storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long a writer waits for a document lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `.sprintboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration for a board root, or return defaults
    ///
    /// Takes the root's file whole; falls back to the user-level file only
    /// when the root has none or it fails to load. An unreadable or invalid
    /// file is skipped with a warning.
    pub fn load_from_root(root: &Path) -> Self {
        Self::load_first(&[Some(root.join(CONFIG_FILE)), user_config_path()])
    }

    /// First candidate that exists and loads, or defaults
    fn load_first(candidates: &[Option<PathBuf>]) -> Self {
        for path in candidates.iter().flatten().filter(|path| path.exists()) {
            match Self::load(path) {
                Ok(config) => return config,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config")
                }
            }
        }
        Self::default()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.default_project.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "default_project cannot be empty".to_string(),
            ));
        }
        self.tasks.validate()?;
        self.labels.validate()?;
        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.key_prefix {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                return Err(Error::InvalidConfig(
                    "tasks.key_prefix cannot be empty".to_string(),
                ));
            }
            if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                return Err(Error::InvalidConfig(
                    "tasks.key_prefix must be alphanumeric".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl LabelsConfig {
    fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(Error::InvalidConfig(
                "labels.palette cannot be empty".to_string(),
            ));
        }
        for color in &self.palette {
            if !is_hex_color(color) {
                return Err(Error::InvalidConfig(format!(
                    "labels.palette has invalid color '{color}'"
                )));
            }
        }
        Ok(())
    }
}

/// `#rgb` or `#rrggbb`
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Location of the user-level config file, if the platform has one
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "lab68", "sprintboard")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
