pub mod exec;
pub mod export;
pub mod list;
pub mod packages;
pub mod status;
pub mod sync;

use anyhow::{Context as _, Result};
use reconcile::InstalledSet;
use wingetkit::{Backend, Client};

use crate::Context;
use crate::progress;
use crate::store::FileStore;

/// Open a client for the configured backend
pub fn open_client(ctx: &Context) -> Result<Client> {
    let backend = ctx.settings.backend;
    Client::new(backend, ctx.settings.executable_path(), ctx.cancel.clone())
        .with_context(|| format!("Failed to open {backend} backend"))
}

/// Open the desired-state document store
pub fn open_store(ctx: &Context) -> Result<FileStore> {
    Ok(FileStore::new(ctx.settings.packages_path()?))
}

/// List installed packages behind a spinner
pub fn read_installed(ctx: &Context, backend: &dyn Backend) -> Result<InstalledSet> {
    let pb = progress::spinner_unless(ctx.quiet, "Reading installed packages...");

    match backend.list_installed() {
        Ok(packages) => {
            let set: InstalledSet = packages.into_iter().collect();
            pb.finish_and_clear();
            log::info!("{} package(s) installed", set.len());
            Ok(set)
        }
        Err(e) => {
            progress::finish_error(&pb, "Could not read installed packages");
            Err(e).context("Failed to list installed packages")
        }
    }
}

/// Whether an error chain was caused by cancellation
pub fn is_cancelled(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<wingetkit::Error>(),
            Some(wingetkit::Error::Cancelled)
        )
    })
}
