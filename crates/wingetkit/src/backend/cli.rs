//! Backend that executes the winget command line.

use crate::args;
use crate::backend::{Backend, listing};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::exit_codes::{self, ExitClass};
use crate::locate;
use crate::process::{self, RunOptions};
use crate::types::{InstalledPackage, Outcome, PackageDefinition, PackageId, ProcessResult};
use std::path::{Path, PathBuf};

/// Backend that runs `winget` as a child process.
pub struct CliBackend {
    /// Path to the winget executable
    executable: PathBuf,
    cancel: CancelToken,
}

impl CliBackend {
    /// Create a backend using the winget found on this machine.
    pub fn new(cancel: CancelToken) -> Self {
        Self::with_executable(locate::locate_executable(), cancel)
    }

    /// Create a backend using a specific executable.
    pub fn with_executable(executable: impl Into<PathBuf>, cancel: CancelToken) -> Self {
        Self {
            executable: executable.into(),
            cancel,
        }
    }

    /// Path of the executable this backend launches.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run_winget(&self, args: &[String]) -> Result<ProcessResult> {
        process::run(&self.executable, args, &RunOptions::default(), &self.cancel)
    }

    /// Run a package operation and classify its exit code.
    fn run_operation(
        &self,
        operation: &'static str,
        id: &PackageId,
        args: &[String],
    ) -> Result<Outcome> {
        let result = self.run_winget(args)?;
        operation_outcome(operation, id, &result)
    }
}

/// Map a finished package operation to its outcome.
fn operation_outcome(operation: &'static str, id: &PackageId, result: &ProcessResult) -> Result<Outcome> {
    match exit_codes::classify(result.exit_code) {
        ExitClass::Success => Ok(Outcome::done()),
        ExitClass::RebootRequired => {
            log::info!("{operation} {id} finished, reboot required");
            Ok(Outcome::reboot())
        }
        ExitClass::NotFound => Err(Error::NotFound { id: id.to_string() }),
        ExitClass::Failure => Err(process_error(operation, id.as_str(), result)),
    }
}

/// Map a finished `winget show` to whether the catalog knows the id.
fn catalog_verdict(id: &PackageId, result: &ProcessResult) -> Result<bool> {
    match exit_codes::classify(result.exit_code) {
        ExitClass::Success => Ok(true),
        ExitClass::NotFound => Ok(false),
        _ => Err(process_error("look up", id.as_str(), result)),
    }
}

fn process_error(operation: &'static str, target: &str, result: &ProcessResult) -> Error {
    Error::from_process(
        operation,
        target,
        result.exit_code,
        &result.stderr,
        &result.stdout,
    )
}

impl Backend for CliBackend {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let result = self.run_winget(&args::list_args())?;

        match exit_codes::classify(result.exit_code) {
            ExitClass::Success => listing::parse_list_output(&result.stdout),
            ExitClass::NotFound => Ok(Vec::new()),
            _ => Err(process_error("list", "installed packages", &result)),
        }
    }

    fn exists_in_catalog(&self, id: &PackageId) -> Result<bool> {
        let result = self.run_winget(&args::show_args(id)?)?;
        catalog_verdict(id, &result)
    }

    fn install(&self, package: &PackageDefinition) -> Result<Outcome> {
        let args = args::install_args(package)?;
        self.run_operation("install", &package.id, &args)
    }

    fn uninstall(&self, id: &PackageId) -> Result<Outcome> {
        let args = args::uninstall_args(id)?;
        self.run_operation("uninstall", id, &args)
    }

    fn upgrade(&self, id: &PackageId) -> Result<Outcome> {
        let args = args::upgrade_args(id)?;
        self.run_operation("upgrade", id, &args)
    }

    fn run_passthrough(&self, args: &[String]) -> Result<i32> {
        process::run_passthrough(&self.executable, args, &self.cancel)
    }
}
