//! Core types for package management.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Identifier of a package in the package manager's catalog
/// (e.g. `Git.Git`, `Microsoft.PowerToys`).
///
/// The original spelling is preserved for display and serialization, but
/// comparison and hashing ignore case, matching how winget resolves ids.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PackageId {
    display: String,
    folded: String,
}

impl PackageId {
    /// Create an identifier from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        let display = id.into();
        let folded = display.to_lowercase();
        Self { display, folded }
    }

    /// The identifier as originally written.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Whether the identifier is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.display.trim().is_empty()
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.display)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<String> for PackageId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for PackageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.display
    }
}

/// One entry of desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDefinition {
    /// Package identifier
    pub id: PackageId,
    /// Version to install (latest when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Install scope (`user` or `machine`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Architecture to select (`x64`, `arm64`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    /// Installer locale (BCP 47)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Install location override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Remove the package instead of installing it
    #[serde(default)]
    pub uninstall: bool,
    /// Force the operation
    #[serde(default)]
    pub force: bool,
    /// Skip installing dependencies
    #[serde(default)]
    pub skip_dependencies: bool,
    /// Ignore installer hash mismatches
    #[serde(default)]
    pub allow_hash_mismatch: bool,
}

impl PackageDefinition {
    /// Create a definition that installs the latest version of a package.
    pub fn new(id: impl Into<PackageId>) -> Self {
        Self {
            id: id.into(),
            version: None,
            scope: None,
            architecture: None,
            locale: None,
            location: None,
            uninstall: false,
            force: false,
            skip_dependencies: false,
            allow_hash_mismatch: false,
        }
    }

    /// Create a definition that removes a package.
    pub fn removal(id: impl Into<PackageId>) -> Self {
        Self {
            uninstall: true,
            ..Self::new(id)
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the install scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Information about an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package identifier
    pub id: PackageId,
    /// Display name
    pub name: String,
    /// Installed version
    pub current_version: String,
    /// Newer version offered by the source, if any
    pub available_version: Option<String>,
}

impl InstalledPackage {
    /// Create an installed package record.
    pub fn new(
        id: impl Into<PackageId>,
        name: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_version: current_version.into(),
            available_version: None,
        }
    }

    /// Whether the source offers an upgrade.
    pub fn has_upgrade(&self) -> bool {
        self.available_version.is_some()
    }
}

/// Successful outcome of a single package operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The operation finished but a reboot is pending
    pub reboot_required: bool,
}

impl Outcome {
    /// Operation finished, nothing pending.
    pub fn done() -> Self {
        Self::default()
    }

    /// Operation finished and asked for a reboot.
    pub fn reboot() -> Self {
        Self {
            reboot_required: true,
        }
    }
}

/// Result of running an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code (synthetic and non-zero when the process could not start)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
}

impl ProcessResult {
    /// Whether the process exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_package_id_ignores_case() {
        let a = PackageId::new("Git.Git");
        let b = PackageId::new("git.GIT");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Git.Git");

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&PackageId::new("GIT.git")), Some(&1));
    }

    #[test]
    fn test_package_id_blank() {
        assert!(PackageId::new("").is_blank());
        assert!(PackageId::new("  ").is_blank());
        assert!(!PackageId::new("A.B").is_blank());
    }

    #[test]
    fn test_package_id_orders_case_insensitively() {
        let mut ids = vec![
            PackageId::new("zig.zig"),
            PackageId::new("Adobe.Acrobat"),
            PackageId::new("git.git"),
        ];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(PackageId::as_str).collect();
        assert_eq!(names, vec!["Adobe.Acrobat", "git.git", "zig.zig"]);
    }

    #[test]
    fn test_definition_constructors() {
        let def = PackageDefinition::new("Git.Git").with_scope("user");
        assert!(!def.uninstall);
        assert_eq!(def.scope.as_deref(), Some("user"));

        let removal = PackageDefinition::removal("Old.Tool");
        assert!(removal.uninstall);
        assert_eq!(removal.id.as_str(), "Old.Tool");
    }

    #[test]
    fn test_process_result_success() {
        let result = ProcessResult {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::from_millis(5),
        };
        assert!(result.succeeded());
        assert!(
            !ProcessResult {
                exit_code: 1,
                ..result
            }
            .succeeded()
        );
    }
}
