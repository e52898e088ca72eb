//! Desired-state document and its storage
//!
//! The document is a JSON object keyed by package id:
//!
//! ```json
//! {
//!   "revision": 3,
//!   "updatedAt": "2026-01-12T09:30:00Z",
//!   "packages": {
//!     "Git.Git": {},
//!     "Microsoft.PowerToys": { "scope": "machine" },
//!     "Old.Tool": { "uninstall": true }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use reconcile::DesiredState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use wingetkit::{PackageDefinition, PackageId};

/// Sparse per-package record as stored in the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageRecord {
    /// Explicit id; the map key is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub uninstall: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub force: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub skip_dependencies: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub allow_hash_mismatch: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PackageRecord {
    /// Record carrying the options of a definition
    pub fn from_definition(definition: &PackageDefinition) -> Self {
        Self {
            id: None,
            version: definition.version.clone(),
            scope: definition.scope.clone(),
            architecture: definition.architecture.clone(),
            location: definition.location.clone(),
            locale: definition.locale.clone(),
            uninstall: definition.uninstall,
            force: definition.force,
            skip_dependencies: definition.skip_dependencies,
            allow_hash_mismatch: definition.allow_hash_mismatch,
        }
    }

    /// Package id of an entry stored under `key`: the record's own `id` when
    /// it names one, otherwise the key.
    pub fn id_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(key)
    }

    /// Materialize into a definition, taking the id from `key` unless the
    /// record names one.
    pub fn to_definition(&self, key: &str) -> PackageDefinition {
        PackageDefinition {
            id: PackageId::new(self.id_for(key)),
            version: self.version.clone(),
            scope: self.scope.clone(),
            architecture: self.architecture.clone(),
            locale: self.locale.clone(),
            location: self.location.clone(),
            uninstall: self.uninstall,
            force: self.force,
            skip_dependencies: self.skip_dependencies,
            allow_hash_mismatch: self.allow_hash_mismatch,
        }
    }
}

/// The desired-state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesiredDocument {
    /// Incremented on every save
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub packages: IndexMap<String, PackageRecord>,
}

impl DesiredDocument {
    /// Build the desired state, rejecting empty keys
    pub fn to_desired_state(&self) -> Result<DesiredState> {
        let mut state = DesiredState::new();
        for (index, (key, record)) in self.packages.iter().enumerate() {
            if key.trim().is_empty() {
                anyhow::bail!("Package entry #{} has an empty id", index + 1);
            }
            state.insert(record.to_definition(key));
        }
        Ok(state)
    }

    /// Key of the entry for package `id`, compared case-insensitively.
    ///
    /// An entry whose record names an explicit `id` is found by that id, not
    /// by its key.
    pub fn find_key(&self, id: &str) -> Option<&str> {
        let wanted = PackageId::new(id);
        self.packages
            .iter()
            .find(|(key, record)| PackageId::new(record.id_for(key)) == wanted)
            .map(|(key, _)| key.as_str())
    }

    /// Whether the document has an entry for `id`
    pub fn contains(&self, id: &str) -> bool {
        self.find_key(id).is_some()
    }

    /// Record `id` as desired with `record`'s options, replacing any existing
    /// entry in place.
    pub fn mark_installed(&mut self, id: &str, mut record: PackageRecord) {
        record.uninstall = false;
        let key = self.find_key(id).unwrap_or(id).to_string();
        if let Some(existing) = self.packages.get(&key) {
            record.id = record.id.or_else(|| existing.id.clone());
        }
        self.packages.insert(key, record);
    }

    /// Mark `id` for removal, adding an entry if there is none
    pub fn mark_uninstalled(&mut self, id: &str) {
        let key = self.find_key(id).unwrap_or(id).to_string();
        self.packages.entry(key).or_default().uninstall = true;
    }
}

/// Storage for the desired-state document
pub trait DesiredStateStore {
    /// Load the document
    fn load(&self) -> Result<DesiredDocument>;

    /// Save the document, bumping its revision and timestamp
    fn save(&self, document: &mut DesiredDocument) -> Result<()>;

    /// Human-readable location, for messages
    fn describe(&self) -> String;
}

/// Store keeping the document as pretty-printed JSON in a file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DesiredStateStore for FileStore {
    fn load(&self) -> Result<DesiredDocument> {
        if !self.path.exists() {
            log::debug!(
                "Desired-state file {} does not exist, starting empty",
                self.path.display()
            );
            return Ok(DesiredDocument::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let document: DesiredDocument = serde_json::from_str(&content)
            .with_context(|| format!("Invalid desired-state document: {}", self.path.display()))?;

        log::debug!(
            "Loaded {} package(s) at revision {} from {}",
            document.packages.len(),
            document.revision,
            self.path.display()
        );
        Ok(document)
    }

    fn save(&self, document: &mut DesiredDocument) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        document.revision += 1;
        document.updated_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(document)
            .context("Failed to serialize desired-state document")?;
        fs::write(&self.path, content + "\n")
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        log::debug!(
            "Saved revision {} to {}",
            document.revision,
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
