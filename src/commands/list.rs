use anyhow::Result;
use colored::Colorize;
use reconcile::InstalledSet;

use crate::Context;
use crate::commands;
use crate::store::{DesiredDocument, DesiredStateStore};
use crate::ui;

const ID_WIDTH: usize = 40;
const NAME_WIDTH: usize = 32;

pub fn run(ctx: &Context, installed_only: bool) -> Result<i32> {
    let client = commands::open_client(ctx)?;
    let installed = commands::read_installed(ctx, client.backend())?;

    if installed_only {
        list_installed(&installed);
    } else {
        let document = commands::open_store(ctx)?.load()?;
        list_desired(&document, &installed)?;
    }
    Ok(0)
}

fn list_installed(installed: &InstalledSet) {
    ui::header(&format!("Installed ({})", installed.len()));
    for pkg in installed.sorted() {
        let available = pkg
            .available_version
            .as_deref()
            .map(|v| format!(" → {v}").yellow().to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {}{}",
            ui::column(pkg.id.as_str(), ID_WIDTH),
            ui::column(&pkg.name, NAME_WIDTH).dimmed(),
            pkg.current_version,
            available
        );
    }

    let upgradable = installed.sorted().iter().filter(|pkg| pkg.has_upgrade()).count();
    if upgradable > 0 {
        println!();
        ui::dim(&format!(
            "{} can be upgraded with `pkgsync upgrade <id>`",
            ui::count(upgradable, "package")
        ));
    }
}

fn list_desired(document: &DesiredDocument, installed: &InstalledSet) -> Result<()> {
    let desired = document.to_desired_state()?;
    ui::header(&format!("Desired ({})", desired.len()));

    let mut missing = 0;
    for def in desired.iter() {
        let current = installed.get(&def.id);
        let status = match (def.uninstall, current) {
            (true, Some(_)) => {
                missing += 1;
                format!("{} to remove", "-".red())
            }
            (true, None) => format!("{} removed", "○".dimmed()),
            (false, Some(pkg)) => format!("{} {}", "✓".green(), pkg.current_version),
            (false, None) => {
                missing += 1;
                format!("{} missing", "✗".yellow())
            }
        };
        println!("  {} {}", ui::column(def.id.as_str(), ID_WIDTH), status);
    }

    println!();
    if missing == 0 {
        ui::success("Everything is in sync");
    } else {
        ui::info(&format!(
            "{} out of sync, run `pkgsync sync` to apply",
            ui::count(missing, "package")
        ));
    }
    Ok(())
}
