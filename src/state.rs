use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::SyncResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// State file name inside the state directory
const STATE_FILE: &str = "sync-state.toml";

/// Outcome of the last sync, persisted between runs
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// When the last sync finished
    pub last_sync: Option<DateTime<Utc>>,

    /// Revision of the desired-state document that was applied
    #[serde(default)]
    pub revision: u64,

    /// Packages installed by the last sync
    #[serde(default)]
    pub installed: Vec<String>,

    /// Packages uninstalled by the last sync
    #[serde(default)]
    pub uninstalled: Vec<String>,

    /// Packages that failed (package id, error message)
    #[serde(default)]
    pub failed: Vec<(String, String)>,

    /// Some operation asked for a reboot
    #[serde(default)]
    pub reboot_required: bool,

    /// Exit code of the last sync
    #[serde(default)]
    pub exit_code: i32,

    /// The last sync was cancelled before it finished
    #[serde(default)]
    pub interrupted: bool,
}

impl SyncState {
    /// Build state from a sync result
    pub fn from_result(result: &SyncResult, revision: u64, interrupted: bool) -> Self {
        Self {
            last_sync: Some(Utc::now()),
            revision,
            installed: result.installed.iter().map(ToString::to_string).collect(),
            uninstalled: result.uninstalled.iter().map(ToString::to_string).collect(),
            failed: result
                .failed
                .iter()
                .zip(&result.errors)
                .map(|(id, message)| (id.to_string(), message.clone()))
                .collect(),
            reboot_required: result.reboot_required,
            exit_code: result.exit_code,
            interrupted,
        }
    }

    /// Get the state file path
    fn state_file() -> Result<PathBuf> {
        Ok(paths::state_dir()?.join(STATE_FILE))
    }

    /// Load state from disk, or return default if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::state_file()?)
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::state_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: SyncState = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Whether a sync has ever been recorded
    pub fn has_run(&self) -> bool {
        self.last_sync.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_result() -> SyncResult {
        let mut result = SyncResult::default();
        result.installed.push("Git.Git".into());
        result.uninstalled.push("Old.Tool".into());
        result.failed.push("Bad.Pkg".into());
        result
            .errors
            .push("install Bad.Pkg failed: installer exited with 1603".into());
        result.reboot_required = true;
        result.finalize();
        result
    }

    #[test]
    fn test_from_result() {
        let state = SyncState::from_result(&sample_result(), 7, false);

        assert!(state.has_run());
        assert_eq!(state.revision, 7);
        assert_eq!(state.installed, vec!["Git.Git"]);
        assert_eq!(state.uninstalled, vec!["Old.Tool"]);
        assert_eq!(state.failed.len(), 1);
        assert_eq!(state.failed[0].0, "Bad.Pkg");
        assert!(state.failed[0].1.contains("1603"));
        assert!(state.reboot_required);
        assert_eq!(state.exit_code, 1);
        assert!(!state.interrupted);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join(STATE_FILE);

        let state = SyncState::from_result(&sample_result(), 3, true);
        state.save_to(&path).unwrap();

        let loaded = SyncState::load_from(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let state = SyncState::load_from(&dir.path().join(STATE_FILE)).unwrap();
        assert!(!state.has_run());
        assert!(state.failed.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILE);
        fs::write(&path, "revision = \"not a number\"").unwrap();
        assert!(SyncState::load_from(&path).is_err());
    }
}
