//! # Reconcile
//!
//! Desired-state reconciliation for installed packages.
//!
//! ## Core Concepts
//!
//! - **DesiredState**: packages that should (or should not) be installed, in document order
//! - **InstalledSet**: what the package manager reports as installed
//! - **SyncPlan**: installs and uninstalls needed to close the gap
//! - **Applier**: runs a plan one operation at a time and collects a [`SyncResult`]
//!
//! ## Example
//!
//! ```no_run
//! use reconcile::{DesiredState, InstalledSet, NoProgress, apply, plan_with_catalog};
//! use wingetkit::{BackendKind, CancelToken, Client, PackageDefinition};
//!
//! let client = Client::new(BackendKind::Cli, None, CancelToken::new()).unwrap();
//! let backend = client.backend();
//!
//! let desired: DesiredState = [PackageDefinition::new("Git.Git")].into_iter().collect();
//! let installed: InstalledSet = backend.list_installed().unwrap().into_iter().collect();
//!
//! let plan = plan_with_catalog(&desired, &installed, backend).unwrap();
//! let result = apply(&plan, backend, &mut NoProgress).unwrap();
//! std::process::exit(result.exit_code);
//! ```
//!
//! Individual package failures are data in the [`SyncResult`]; only a fatal
//! error (cancellation) ends a run early, as [`Interrupted`].

pub mod applier;
pub mod context;
pub mod error;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use applier::apply;
pub use context::{Action, NoProgress, ProgressCallback};
pub use error::Interrupted;
pub use planner::{plan, plan_with_catalog};
pub use types::{DesiredState, EXIT_FAILURE, EXIT_SUCCESS, InstalledSet, SyncPlan, SyncResult};
