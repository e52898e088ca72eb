//! Progress reporting hooks
//!
//! The applier reports through [`ProgressCallback`] so the crate stays free
//! of any terminal UI dependency.

use std::fmt;
use wingetkit::{Outcome, PackageId};

/// Kind of package operation performed by the applier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Install a package
    Install,
    /// Uninstall a package
    Uninstall,
}

impl Action {
    /// Verb used in messages
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Progress callback for apply operations
///
/// Implement this trait to receive progress updates while a plan runs.
pub trait ProgressCallback {
    /// Called once before the first operation
    fn on_start(&mut self, total: usize);

    /// Called before an operation is sent to the backend
    fn on_operation_start(&mut self, action: Action, id: &PackageId);

    /// Called after an operation, with its outcome or error message
    fn on_operation_complete(
        &mut self,
        action: Action,
        id: &PackageId,
        result: Result<Outcome, &str>,
    );

    /// Called once after the last operation
    fn on_finish(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _total: usize) {}
    fn on_operation_start(&mut self, _action: Action, _id: &PackageId) {}
    fn on_operation_complete(
        &mut self,
        _action: Action,
        _id: &PackageId,
        _result: Result<Outcome, &str>,
    ) {
    }
    fn on_finish(&mut self) {}
}
