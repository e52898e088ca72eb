use anyhow::Result;
use reconcile::InstalledSet;

use crate::Context;
use crate::commands;
use crate::store::{DesiredDocument, DesiredStateStore, PackageRecord};
use crate::ui;

/// Add every installed package the document does not mention
pub fn run(ctx: &Context, include_versions: bool) -> Result<i32> {
    let client = commands::open_client(ctx)?;
    let installed = commands::read_installed(ctx, client.backend())?;

    let store = commands::open_store(ctx)?;
    let mut document = store.load()?;

    let added = merge_installed(&mut document, &installed, include_versions);
    if added.is_empty() {
        ui::success("Document already lists every installed package");
        return Ok(0);
    }

    store.save(&mut document)?;
    for id in &added {
        ui::dim(&format!("+ {id}"));
    }
    ui::success(&format!(
        "Added {} to {} (revision {})",
        ui::count(added.len(), "package"),
        store.describe(),
        document.revision
    ));
    Ok(0)
}

/// Add missing installed packages in id order, returning the added ids
fn merge_installed(
    document: &mut DesiredDocument,
    installed: &InstalledSet,
    include_versions: bool,
) -> Vec<String> {
    let mut added = Vec::new();
    for pkg in installed.sorted() {
        if document.contains(pkg.id.as_str()) {
            continue;
        }
        let record = PackageRecord {
            version: include_versions.then(|| pkg.current_version.clone()),
            ..PackageRecord::default()
        };
        document.mark_installed(pkg.id.as_str(), record);
        added.push(pkg.id.to_string());
    }
    added
}
