//! User settings (`config.toml` in the config directory)

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use wingetkit::BackendKind;

/// Settings file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default desired-state document name inside the config directory
pub const PACKAGES_FILE: &str = "packages.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend used to talk to the package manager
    pub backend: BackendKind,

    /// Override for the winget executable path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    /// Path of the desired-state document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages_file: Option<String>,
}

impl Settings {
    /// Default settings file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(CONFIG_FILE))
    }

    /// Load settings from an explicit file, or the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::load_from(path)
            }
            None => Self::load_from(&Self::config_file()?),
        }
    }

    /// Load settings from a path, returning defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Expanded executable override, if any
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.executable.as_deref().map(paths::expand)
    }

    /// Resolved path of the desired-state document
    pub fn packages_path(&self) -> Result<PathBuf> {
        match &self.packages_file {
            Some(file) => Ok(paths::expand(file)),
            None => Ok(paths::config_dir()?.join(PACKAGES_FILE)),
        }
    }
}
