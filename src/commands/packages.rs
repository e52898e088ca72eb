//! Single-package commands: install, uninstall, upgrade

use anyhow::{Context as _, Result};
use wingetkit::{Outcome, PackageDefinition, PackageId};

use crate::Context;
use crate::cli::InstallArgs;
use crate::commands;
use crate::progress;
use crate::store::{DesiredStateStore, PackageRecord};
use crate::ui;

/// Install a package, then record it in the desired-state document
pub fn install(ctx: &Context, args: InstallArgs) -> Result<i32> {
    let definition = definition_from_args(args);
    let id = definition.id.clone();

    let client = commands::open_client(ctx)?;
    let outcome = with_spinner(ctx, &format!("Installing {id}..."), || client.install(&definition))
        .with_context(|| format!("Failed to install {id}"))?;
    report(&format!("Installed {id}"), outcome);

    let store = commands::open_store(ctx)?;
    let mut document = store.load()?;
    document.mark_installed(id.as_str(), PackageRecord::from_definition(&definition));
    store.save(&mut document)?;
    ui::dim(&format!(
        "Recorded in {} (revision {})",
        store.describe(),
        document.revision
    ));
    Ok(0)
}

/// Uninstall a package, then mark it for removal in the document
pub fn uninstall(ctx: &Context, id: &str) -> Result<i32> {
    let id = PackageId::new(id);

    let client = commands::open_client(ctx)?;
    let outcome = with_spinner(ctx, &format!("Uninstalling {id}..."), || client.uninstall(&id))
        .with_context(|| format!("Failed to uninstall {id}"))?;
    report(&format!("Uninstalled {id}"), outcome);

    let store = commands::open_store(ctx)?;
    let mut document = store.load()?;
    document.mark_uninstalled(id.as_str());
    store.save(&mut document)?;
    ui::dim(&format!(
        "Marked for removal in {} (revision {})",
        store.describe(),
        document.revision
    ));
    Ok(0)
}

/// Upgrade a package; the document is left untouched
pub fn upgrade(ctx: &Context, id: &str) -> Result<i32> {
    let id = PackageId::new(id);

    let client = commands::open_client(ctx)?;
    let outcome = with_spinner(ctx, &format!("Upgrading {id}..."), || client.upgrade(&id))
        .with_context(|| format!("Failed to upgrade {id}"))?;
    report(&format!("Upgraded {id}"), outcome);
    Ok(0)
}

fn definition_from_args(args: InstallArgs) -> PackageDefinition {
    PackageDefinition {
        version: args.version,
        scope: args.scope,
        architecture: args.architecture,
        locale: args.locale,
        location: args.location,
        force: args.force,
        skip_dependencies: args.skip_dependencies,
        allow_hash_mismatch: args.allow_hash_mismatch,
        ..PackageDefinition::new(args.id)
    }
}

fn with_spinner<T>(
    ctx: &Context,
    msg: &str,
    f: impl FnOnce() -> wingetkit::Result<T>,
) -> wingetkit::Result<T> {
    let pb = progress::spinner_unless(ctx.quiet, msg);
    let result = f();
    pb.finish_and_clear();
    result
}

fn report(msg: &str, outcome: Outcome) {
    ui::success(msg);
    if outcome.reboot_required {
        ui::warn("A reboot is required to finish this change");
    }
}
