//! Backend that talks to a structured package management API.
//!
//! The API is reached through the [`ManagementApi`] trait so the binding to
//! the platform's package manager service stays out of this crate. Every
//! call runs inside an [`ApiSession`], which is released when it goes out of
//! scope, including on error paths.
//!
//! Passthrough commands have no structured equivalent and go through the
//! process executor.

use crate::args;
use crate::backend::Backend;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::process;
use crate::types::{InstalledPackage, Outcome, PackageDefinition, PackageId};
use std::path::PathBuf;

/// Status reported by the management API for a package operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// Operation completed
    Ok,
    /// Package unknown to the catalog
    NotFound,
    /// Operation failed
    Failed,
}

/// Typed result of an install, uninstall or upgrade call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOperationResult {
    /// Overall status
    pub status: ApiStatus,
    /// The API asked for a reboot to finish the operation
    pub reboot_required: bool,
    /// Numeric error code reported alongside a failure
    pub error_code: i32,
    /// Extended error text, when the API supplies one
    pub extended_error: Option<String>,
}

impl ApiOperationResult {
    /// A successful result.
    pub fn ok() -> Self {
        Self {
            status: ApiStatus::Ok,
            reboot_required: false,
            error_code: 0,
            extended_error: None,
        }
    }

    /// A successful result with a pending reboot.
    pub fn ok_reboot() -> Self {
        Self {
            reboot_required: true,
            ..Self::ok()
        }
    }

    /// A failed result.
    pub fn failed(error_code: i32, extended_error: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Failed,
            reboot_required: false,
            error_code,
            extended_error: Some(extended_error.into()),
        }
    }

    /// A not-found result.
    pub fn not_found() -> Self {
        Self {
            status: ApiStatus::NotFound,
            ..Self::ok()
        }
    }
}

/// Binding to a structured package management service.
pub trait ManagementApi: Send + Sync {
    /// Acquire whatever the service needs for a sequence of calls.
    fn open_session(&self) -> Result<()>;

    /// Release what [`ManagementApi::open_session`] acquired.
    fn close_session(&self);

    /// Enumerate installed packages.
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>>;

    /// Look an identifier up in the catalog.
    fn find_package(&self, id: &str) -> Result<bool>;

    /// Install a package with the options from its definition.
    fn install(&self, package: &PackageDefinition) -> Result<ApiOperationResult>;

    /// Uninstall a package.
    fn uninstall(&self, id: &str) -> Result<ApiOperationResult>;

    /// Upgrade a package.
    fn upgrade(&self, id: &str) -> Result<ApiOperationResult>;
}

/// Open session on a [`ManagementApi`]; closed on drop.
pub struct ApiSession<'a, A: ManagementApi> {
    api: &'a A,
}

impl<'a, A: ManagementApi> ApiSession<'a, A> {
    /// Open a session.
    pub fn open(api: &'a A) -> Result<Self> {
        api.open_session()?;
        Ok(Self { api })
    }

    /// The API the session was opened on.
    pub fn api(&self) -> &A {
        self.api
    }
}

impl<A: ManagementApi> Drop for ApiSession<'_, A> {
    fn drop(&mut self) {
        self.api.close_session();
    }
}

/// Backend over a [`ManagementApi`].
pub struct ApiBackend<A: ManagementApi> {
    api: A,
    /// Executable used for passthrough commands
    executable: PathBuf,
    cancel: CancelToken,
}

impl<A: ManagementApi> ApiBackend<A> {
    /// Create a backend over `api`.
    pub fn new(api: A, executable: impl Into<PathBuf>, cancel: CancelToken) -> Self {
        Self {
            api,
            executable: executable.into(),
            cancel,
        }
    }

    fn session(&self) -> Result<ApiSession<'_, A>> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        ApiSession::open(&self.api)
    }

    fn finish(
        &self,
        operation: &'static str,
        id: &PackageId,
        result: ApiOperationResult,
    ) -> Result<Outcome> {
        match result.status {
            ApiStatus::Ok => {
                if result.reboot_required {
                    log::info!("{operation} {id} finished, reboot required");
                }
                Ok(Outcome {
                    reboot_required: result.reboot_required,
                })
            }
            ApiStatus::NotFound => Err(Error::NotFound { id: id.to_string() }),
            ApiStatus::Failed => Err(Error::Api {
                operation,
                id: id.to_string(),
                message: result
                    .extended_error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("error code {}", result.error_code)),
            }),
        }
    }
}

impl<A: ManagementApi> Backend for ApiBackend<A> {
    fn name(&self) -> &'static str {
        "api"
    }

    fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let session = self.session()?;
        session.api().installed_packages()
    }

    fn exists_in_catalog(&self, id: &PackageId) -> Result<bool> {
        let id_str = args::require_id(id, "look up")?;
        let session = self.session()?;
        session.api().find_package(id_str)
    }

    fn install(&self, package: &PackageDefinition) -> Result<Outcome> {
        args::require_id(&package.id, "install")?;
        let session = self.session()?;
        let result = session.api().install(package)?;
        self.finish("install", &package.id, result)
    }

    fn uninstall(&self, id: &PackageId) -> Result<Outcome> {
        let id_str = args::require_id(id, "uninstall")?;
        let session = self.session()?;
        let result = session.api().uninstall(id_str)?;
        self.finish("uninstall", id, result)
    }

    fn upgrade(&self, id: &PackageId) -> Result<Outcome> {
        let id_str = args::require_id(id, "upgrade")?;
        let session = self.session()?;
        let result = session.api().upgrade(id_str)?;
        self.finish("upgrade", id, result)
    }

    fn run_passthrough(&self, args: &[String]) -> Result<i32> {
        process::run_passthrough(&self.executable, args, &self.cancel)
    }
}

/// Placeholder binding used when no management API is compiled in.
///
/// Opening a session always fails with [`Error::ApiUnavailable`].
#[derive(Debug, Default)]
pub struct UnavailableApi;

impl ManagementApi for UnavailableApi {
    fn open_session(&self) -> Result<()> {
        Err(Error::ApiUnavailable {
            reason: "no management API binding is available on this platform".to_string(),
        })
    }

    fn close_session(&self) {}

    fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        self.open_session().map(|()| Vec::new())
    }

    fn find_package(&self, _id: &str) -> Result<bool> {
        self.open_session().map(|()| false)
    }

    fn install(&self, _package: &PackageDefinition) -> Result<ApiOperationResult> {
        self.open_session().map(|()| ApiOperationResult::not_found())
    }

    fn uninstall(&self, _id: &str) -> Result<ApiOperationResult> {
        self.open_session().map(|()| ApiOperationResult::not_found())
    }

    fn upgrade(&self, _id: &str) -> Result<ApiOperationResult> {
        self.open_session().map(|()| ApiOperationResult::not_found())
    }
}
