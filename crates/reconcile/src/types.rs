//! Core types for package reconciliation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wingetkit::{InstalledPackage, PackageDefinition, PackageId};

/// Exit code of a run in which every operation succeeded
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of a run with at least one failed operation
pub const EXIT_FAILURE: i32 = 1;

/// Desired packages, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    entries: IndexMap<PackageId, PackageDefinition>,
}

impl DesiredState {
    /// Create an empty desired state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry, keeping the position of a replaced one
    pub fn insert(&mut self, definition: PackageDefinition) {
        self.entries.insert(definition.id.clone(), definition);
    }

    /// Look up an entry
    pub fn get(&self, id: &PackageId) -> Option<&PackageDefinition> {
        self.entries.get(id)
    }

    /// Iterate entries in document order
    pub fn iter(&self) -> impl Iterator<Item = &PackageDefinition> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PackageDefinition> for DesiredState {
    fn from_iter<T: IntoIterator<Item = PackageDefinition>>(iter: T) -> Self {
        let mut state = Self::new();
        for definition in iter {
            state.insert(definition);
        }
        state
    }
}

/// Installed packages keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    packages: HashMap<PackageId, InstalledPackage>,
}

impl InstalledSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package. A duplicate id keeps the entry seen first.
    pub fn insert(&mut self, package: InstalledPackage) {
        self.packages.entry(package.id.clone()).or_insert(package);
    }

    /// Whether an id is installed
    pub fn contains(&self, id: &PackageId) -> bool {
        self.packages.contains_key(id)
    }

    /// Look up an installed package
    pub fn get(&self, id: &PackageId) -> Option<&InstalledPackage> {
        self.packages.get(id)
    }

    /// Remove a package, returning it if present
    pub fn remove(&mut self, id: &PackageId) -> Option<InstalledPackage> {
        self.packages.remove(id)
    }

    /// Number of installed packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether nothing is installed
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Installed packages sorted by id
    pub fn sorted(&self) -> Vec<&InstalledPackage> {
        let mut packages: Vec<_> = self.packages.values().collect();
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        packages
    }
}

impl FromIterator<InstalledPackage> for InstalledSet {
    fn from_iter<T: IntoIterator<Item = InstalledPackage>>(iter: T) -> Self {
        let mut set = Self::new();
        for package in iter {
            set.insert(package);
        }
        set
    }
}

/// What a run will do, computed from desired and installed state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Desired and absent
    pub to_install: Vec<PackageDefinition>,
    /// Marked for removal and present
    pub to_uninstall: Vec<PackageDefinition>,
    /// Desired and already present
    pub already_installed: Vec<PackageDefinition>,
    /// Desired but unknown to the catalog
    pub not_found: Vec<PackageDefinition>,
}

impl SyncPlan {
    /// Whether there is nothing to install or uninstall
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_uninstall.is_empty()
    }

    /// Number of operations the plan will run
    pub fn total_count(&self) -> usize {
        self.to_install.len() + self.to_uninstall.len()
    }
}

/// Outcome of applying a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Successfully installed, in order
    pub installed: Vec<PackageId>,
    /// Successfully uninstalled, in order
    pub uninstalled: Vec<PackageId>,
    /// Ids whose operation failed
    pub failed: Vec<PackageId>,
    /// One message per failure
    pub errors: Vec<String>,
    /// Some operation asked for a reboot
    pub reboot_required: bool,
    /// Process exit code for the run
    pub exit_code: i32,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self {
            installed: Vec::new(),
            uninstalled: Vec::new(),
            failed: Vec::new(),
            errors: Vec::new(),
            reboot_required: false,
            exit_code: EXIT_SUCCESS,
        }
    }
}

impl SyncResult {
    /// Check if every operation succeeded
    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS && self.failed.is_empty()
    }

    /// Number of operations that changed the system
    pub fn total_changes(&self) -> usize {
        self.installed.len() + self.uninstalled.len()
    }

    /// Set the exit code from the recorded failures
    pub fn finalize(&mut self) {
        self.exit_code = if self.failed.is_empty() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_state_keeps_document_order() {
        let state: DesiredState = ["Zig.Zig", "Git.Git", "Adobe.Acrobat"]
            .into_iter()
            .map(PackageDefinition::new)
            .collect();

        let ids: Vec<&str> = state.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["Zig.Zig", "Git.Git", "Adobe.Acrobat"]);
    }

    #[test]
    fn test_desired_state_replaces_case_insensitively() {
        let mut state = DesiredState::new();
        state.insert(PackageDefinition::new("Git.Git"));
        state.insert(PackageDefinition::new("Node.Node"));
        state.insert(PackageDefinition::new("git.git").with_version("2.40.0"));

        assert_eq!(state.len(), 2);
        let first = state.iter().next().unwrap();
        assert_eq!(first.version.as_deref(), Some("2.40.0"));
    }

    #[test]
    fn test_installed_set_keeps_first_duplicate() {
        let set: InstalledSet = [
            InstalledPackage::new("Git.Git", "Git", "2.43.0"),
            InstalledPackage::new("GIT.GIT", "Git (dup)", "1.0"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&"git.git".into()).unwrap().current_version, "2.43.0");
    }

    #[test]
    fn test_plan_counts() {
        let mut plan = SyncPlan::default();
        assert!(plan.is_empty());

        plan.already_installed.push(PackageDefinition::new("A"));
        plan.not_found.push(PackageDefinition::new("B"));
        assert!(plan.is_empty());
        assert_eq!(plan.total_count(), 0);

        plan.to_install.push(PackageDefinition::new("C"));
        plan.to_uninstall.push(PackageDefinition::removal("D"));
        assert!(!plan.is_empty());
        assert_eq!(plan.total_count(), 2);
    }

    #[test]
    fn test_result_finalize() {
        let mut result = SyncResult::default();
        result.finalize();
        assert!(result.is_success());

        result.failed.push("X".into());
        result.finalize();
        assert_eq!(result.exit_code, EXIT_FAILURE);
        assert!(!result.is_success());
    }
}
