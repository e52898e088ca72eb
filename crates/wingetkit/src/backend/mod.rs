//! Backend abstraction for package manager operations.
//!
//! The [`Backend`] trait is the one capability set the reconciliation engine
//! depends on. Two implementations exist:
//! - [`cli::CliBackend`] runs the winget executable and classifies exit codes
//! - [`api::ApiBackend`] calls a structured management API in-process

pub mod api;
pub mod cli;
pub mod listing;

use crate::error::Result;
use crate::types::{InstalledPackage, Outcome, PackageDefinition, PackageId};
use serde::{Deserialize, Serialize};

/// Backend trait for package manager operations.
pub trait Backend: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// List every installed package.
    fn list_installed(&self) -> Result<Vec<InstalledPackage>>;

    /// Check whether the catalog knows an identifier. Read-only.
    fn exists_in_catalog(&self, id: &PackageId) -> Result<bool>;

    /// Install a package.
    fn install(&self, package: &PackageDefinition) -> Result<Outcome>;

    /// Uninstall a package.
    fn uninstall(&self, id: &PackageId) -> Result<Outcome>;

    /// Upgrade a package to the newest available version.
    fn upgrade(&self, id: &PackageId) -> Result<Outcome>;

    /// Run an arbitrary package manager command with live output.
    fn run_passthrough(&self, args: &[String]) -> Result<i32>;
}

/// Which backend implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Invoke the winget executable
    #[default]
    Cli,
    /// Call the management API in-process
    Api,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cli => write!(f, "cli"),
            BackendKind::Api => write!(f, "api"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cli" | "process" => Ok(BackendKind::Cli),
            "api" | "structured" => Ok(BackendKind::Api),
            other => Err(format!("unknown backend '{other}' (expected 'cli' or 'api')")),
        }
    }
}
