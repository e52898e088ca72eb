//! # wingetkit
//!
//! Rust library for driving the Windows package manager (winget).
//!
//! This crate provides functionality for:
//! - Running external processes with captured or live output and cancellation
//! - Building winget command lines and classifying its exit codes
//! - Parsing the installed-package listing
//! - A [`Backend`] trait with a command-line and a structured-API implementation
//!
//! ## Example
//!
//! ```no_run
//! use wingetkit::{BackendKind, CancelToken, Client, PackageDefinition};
//!
//! let client = Client::new(BackendKind::Cli, None, CancelToken::new()).expect("no backend");
//!
//! for pkg in client.list_installed().expect("listing failed") {
//!     println!("{} {}", pkg.id, pkg.current_version);
//! }
//!
//! let outcome = client.install(&PackageDefinition::new("Git.Git")).expect("install failed");
//! if outcome.reboot_required {
//!     println!("reboot to finish");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod backend;
pub mod cancel;
pub mod error;
pub mod exit_codes;
pub mod locate;
pub mod process;
mod tree;
pub mod types;

pub use backend::{Backend, BackendKind};
pub use cancel::CancelToken;
pub use error::{Error, ErrorCategory, Result};
pub use types::{InstalledPackage, Outcome, PackageDefinition, PackageId, ProcessResult};

use backend::api::{ApiBackend, ApiSession, UnavailableApi};
use backend::cli::CliBackend;
use std::path::PathBuf;

/// High-level client for winget operations.
///
/// The client wraps a backend chosen at construction time and forwards
/// package operations to it.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client for the given backend kind.
    ///
    /// `executable` overrides the located winget path. For
    /// [`BackendKind::Api`] a session is opened once up front so an
    /// unavailable API is reported here rather than on the first operation.
    pub fn new(kind: BackendKind, executable: Option<PathBuf>, cancel: CancelToken) -> Result<Self> {
        let executable = executable.unwrap_or_else(locate::locate_executable);
        log::debug!("using {} backend with {}", kind, executable.display());

        let backend: Box<dyn Backend> = match kind {
            BackendKind::Cli => Box::new(CliBackend::with_executable(executable, cancel)),
            BackendKind::Api => {
                let api = UnavailableApi;
                drop(ApiSession::open(&api)?);
                Box::new(ApiBackend::new(api, executable, cancel))
            }
        };

        Ok(Self { backend })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// List installed packages.
    pub fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        self.backend.list_installed()
    }

    /// Check whether the catalog knows an identifier.
    pub fn exists_in_catalog(&self, id: &PackageId) -> Result<bool> {
        self.backend.exists_in_catalog(id)
    }

    /// Install a package.
    pub fn install(&self, package: &PackageDefinition) -> Result<Outcome> {
        self.backend.install(package)
    }

    /// Uninstall a package.
    pub fn uninstall(&self, id: &PackageId) -> Result<Outcome> {
        self.backend.uninstall(id)
    }

    /// Upgrade a package.
    pub fn upgrade(&self, id: &PackageId) -> Result<Outcome> {
        self.backend.upgrade(id)
    }

    /// Run an arbitrary winget command with live output.
    pub fn run_passthrough(&self, args: &[String]) -> Result<i32> {
        self.backend.run_passthrough(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_client_uses_given_executable() {
        let client = Client::new(
            BackendKind::Cli,
            Some(PathBuf::from("/opt/winget")),
            CancelToken::new(),
        )
        .unwrap();
        assert_eq!(client.backend().name(), "cli");
    }

    #[test]
    fn test_api_client_reports_unavailable() {
        let result = Client::new(BackendKind::Api, Some(PathBuf::from("winget")), CancelToken::new());
        match result {
            Err(Error::ApiUnavailable { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("api backend should be unavailable"),
        }
    }
}
