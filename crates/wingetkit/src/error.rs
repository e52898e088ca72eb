//! Error types for package manager operations.
//!
//! Errors are categorized so callers can tell configuration mistakes and
//! per-package failures (recorded and skipped) apart from fatal conditions
//! such as cancellation (propagated).

use thiserror::Error;

/// Categories of package manager errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input rejected before anything was launched
    Config,
    /// Package unknown to the catalog
    NotFound,
    /// The package manager ran and reported a failure
    Operation,
    /// The run was cancelled
    Cancelled,
    /// Unexpected I/O fault unrelated to the target process
    Io,
}

impl ErrorCategory {
    /// Whether an error of this category must stop a reconciliation run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Config => "Invalid configuration",
            Self::NotFound => "Package not found",
            Self::Operation => "Package operation failed",
            Self::Cancelled => "Cancelled",
            Self::Io => "I/O error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Config => "Check the package identifier and settings",
            Self::NotFound => "Verify the identifier with `winget search`",
            Self::Operation => "Re-run with -vv to see the package manager output",
            Self::Cancelled => "Run the command again to finish the remaining work",
            Self::Io => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while driving the package manager.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was asked to target an empty package identifier
    #[error("cannot {operation} a package with an empty identifier")]
    EmptyIdentifier {
        /// Operation that was being prepared (install, uninstall, ...)
        operation: &'static str,
    },

    /// Package identifier unknown to the package manager
    #[error("package not found: {id}")]
    NotFound {
        /// Identifier that could not be resolved
        id: String,
    },

    /// The package manager exited with a failure code
    #[error("{operation} {id} exited with code {exit_code}: {message}")]
    OperationFailed {
        /// Operation that failed
        operation: &'static str,
        /// Identifier the operation targeted
        id: String,
        /// Exit code of the package manager process
        exit_code: i32,
        /// Diagnostic text captured from the process
        message: String,
    },

    /// The structured management API reported a failure
    #[error("{operation} {id} failed: {message}")]
    Api {
        /// Operation that failed
        operation: &'static str,
        /// Identifier the operation targeted
        id: String,
        /// Error detail surfaced by the API
        message: String,
    },

    /// The structured backend was selected but cannot be opened
    #[error("management API unavailable: {reason}")]
    ApiUnavailable {
        /// Why the API session could not be opened
        reason: String,
    },

    /// Installed package listing could not be understood
    #[error("could not parse package listing: {message}")]
    ListingParse {
        /// What was wrong with the listing
        message: String,
    },

    /// The run was cancelled while waiting on the package manager
    #[error("operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyIdentifier { .. } | Error::ApiUnavailable { .. } => ErrorCategory::Config,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::OperationFailed { .. } | Error::Api { .. } | Error::ListingParse { .. } => {
                ErrorCategory::Operation
            }
            Error::Cancelled => ErrorCategory::Cancelled,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether this error must stop a reconciliation run.
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }

    /// Build an operation failure from a finished process.
    ///
    /// stderr is kept as the diagnostic; when the package manager wrote
    /// nothing there, the tail of stdout is used instead (winget reports most
    /// failures on stdout).
    pub fn from_process(
        operation: &'static str,
        id: &str,
        exit_code: i32,
        stderr: &str,
        stdout: &str,
    ) -> Self {
        let message = if stderr.trim().is_empty() {
            last_meaningful_line(stdout)
        } else {
            stderr.trim().to_string()
        };

        Error::OperationFailed {
            operation,
            id: id.to_string(),
            exit_code,
            message,
        }
    }
}

/// Last non-empty line of process output, with progress noise removed.
fn last_meaningful_line(output: &str) -> String {
    output
        .lines()
        .map(|line| line.rsplit('\r').next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or("no output")
        .to_string()
}

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;
