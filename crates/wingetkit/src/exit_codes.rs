//! winget exit codes the adapter gives meaning to.
//!
//! winget reports HRESULT-style codes; as process exit codes they arrive as
//! negative `i32` values.

/// `APPINSTALLER_CLI_ERROR_NO_APPLICATIONS_FOUND`
pub const NO_APPLICATIONS_FOUND: i32 = 0x8A15_0014_u32 as i32;

/// `APPINSTALLER_CLI_ERROR_INSTALL_REBOOT_REQUIRED_TO_FINISH`
pub const REBOOT_REQUIRED_TO_FINISH: i32 = 0x8A15_0109_u32 as i32;

/// `APPINSTALLER_CLI_ERROR_INSTALL_REBOOT_REQUIRED_FOR_INSTALL`
pub const REBOOT_REQUIRED_FOR_INSTALL: i32 = 0x8A15_010A_u32 as i32;

/// `ERROR_SUCCESS_REBOOT_REQUIRED`, passed through from MSI installers.
pub const MSI_SUCCESS_REBOOT_REQUIRED: i32 = 3010;

/// How an exit code should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Operation succeeded
    Success,
    /// Operation succeeded, reboot pending
    RebootRequired,
    /// Package unknown to the catalog
    NotFound,
    /// Anything else
    Failure,
}

/// Classify a winget exit code.
pub fn classify(code: i32) -> ExitClass {
    match code {
        0 => ExitClass::Success,
        REBOOT_REQUIRED_TO_FINISH | REBOOT_REQUIRED_FOR_INSTALL | MSI_SUCCESS_REBOOT_REQUIRED => {
            ExitClass::RebootRequired
        }
        NO_APPLICATIONS_FOUND => ExitClass::NotFound,
        _ => ExitClass::Failure,
    }
}
