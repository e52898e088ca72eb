use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::commands;
use crate::state::SyncState;
use crate::store::DesiredStateStore;
use crate::ui;

pub fn run(ctx: &Context) -> Result<i32> {
    ui::header("Status");

    let store = commands::open_store(ctx)?;
    let document = store.load()?;
    let removals = document.packages.values().filter(|r| r.uninstall).count();

    ui::section("Desired state");
    ui::kv("Document", &store.describe());
    ui::kv("Revision", &document.revision.to_string());
    if let Some(updated) = document.updated_at {
        ui::kv("Updated", &updated.format("%Y-%m-%d %H:%M UTC").to_string());
    }
    ui::kv(
        "Packages",
        &format!(
            "{} desired, {} marked for removal",
            document.packages.len() - removals,
            removals
        ),
    );

    ui::section("Last sync");
    let state = SyncState::load()?;
    let Some(last_sync) = state.last_sync else {
        ui::dim("No sync recorded yet");
        println!();
        return Ok(0);
    };

    ui::kv("When", &last_sync.format("%Y-%m-%d %H:%M UTC").to_string());
    ui::kv("Revision", &state.revision.to_string());
    if state.revision < document.revision {
        ui::kv("Drift", &"document changed since last sync".yellow().to_string());
    }

    let outcome = if state.interrupted {
        "cancelled".yellow().to_string()
    } else if state.exit_code == 0 {
        "success".green().to_string()
    } else {
        format!("failed (exit {})", state.exit_code).red().to_string()
    };
    ui::kv("Result", &outcome);
    ui::kv(
        "Changes",
        &format!(
            "{} installed, {} uninstalled",
            state.installed.len(),
            state.uninstalled.len()
        ),
    );

    if !state.failed.is_empty() {
        println!();
        println!("  {}", "Failed:".red());
        for (id, message) in &state.failed {
            println!("    {} {}", "✗".red(), id);
            ui::dim(&format!("    {message}"));
        }
    }

    if state.reboot_required {
        println!();
        ui::warn("A reboot is required to finish the last sync");
    }

    println!();
    Ok(0)
}
