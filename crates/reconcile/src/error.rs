//! Errors that stop a reconciliation run

use crate::types::SyncResult;
use thiserror::Error;

/// A run stopped by a fatal error before every operation was attempted.
///
/// `partial` holds everything that completed before the stop, with its exit
/// code already set.
#[derive(Debug, Error)]
#[error("reconciliation interrupted: {source}")]
pub struct Interrupted {
    /// Result of the operations that completed
    pub partial: SyncResult,
    /// The fatal error
    #[source]
    pub source: wingetkit::Error,
}
