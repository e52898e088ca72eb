use anyhow::{Context as _, Result};
use colored::Colorize;
use reconcile::{Interrupted, SyncPlan, SyncResult};

use crate::Context;
use crate::commands;
use crate::progress::{self, SyncProgress};
use crate::state::SyncState;
use crate::store::DesiredStateStore;
use crate::ui;

/// Reconcile installed packages with the desired-state document.
///
/// Returns the process exit code.
pub fn run(ctx: &Context, dry_run: bool, yes: bool) -> Result<i32> {
    let store = commands::open_store(ctx)?;
    let document = store.load()?;
    let desired = document.to_desired_state()?;

    ui::header(if dry_run { "Sync plan" } else { "Sync" });
    ui::kv("Document", &store.describe());
    ui::kv("Revision", &document.revision.to_string());
    ui::kv("Backend", &ctx.settings.backend.to_string());

    if desired.is_empty() {
        println!();
        ui::info("No packages in the desired-state document");
        ui::dim("Add some with `pkgsync install <id>` or `pkgsync export`");
        if !dry_run {
            SyncState::from_result(&SyncResult::default(), document.revision, false).save()?;
        }
        return Ok(0);
    }

    let client = commands::open_client(ctx)?;
    let backend = client.backend();
    let installed = commands::read_installed(ctx, backend)?;

    let pb = progress::spinner_unless(ctx.quiet, "Checking catalog...");
    let plan = reconcile::plan_with_catalog(&desired, &installed, backend);
    pb.finish_and_clear();
    let plan = plan.context("Failed to build sync plan")?;

    print_plan(ctx, &plan);

    if plan.is_empty() {
        println!();
        ui::success("Everything is in sync");
        if !dry_run {
            SyncState::from_result(&SyncResult::default(), document.revision, false).save()?;
        }
        return Ok(0);
    }

    if dry_run {
        println!();
        ui::info("Dry run - no changes made");
        return Ok(0);
    }

    if !yes && !confirm_proceed(&plan)? {
        ui::info("Aborted");
        return Ok(0);
    }

    println!();
    let mut reporter = SyncProgress::new(ctx.quiet);
    let (result, interrupted) = match reconcile::apply(&plan, backend, &mut reporter) {
        Ok(result) => (result, false),
        Err(Interrupted { partial, source }) => {
            ui::warn(&format!("Sync stopped: {source}"));
            (partial, true)
        }
    };

    print_summary(&result, interrupted);
    SyncState::from_result(&result, document.revision, interrupted)
        .save()
        .context("Failed to record sync state")?;

    if interrupted {
        return Ok(crate::EXIT_INTERRUPTED);
    }
    Ok(result.exit_code)
}

fn print_plan(ctx: &Context, plan: &SyncPlan) {
    if !plan.to_uninstall.is_empty() {
        ui::section(&format!("To uninstall ({})", plan.to_uninstall.len()));
        for def in &plan.to_uninstall {
            println!("  {} {}", "-".red(), def.id);
        }
    }

    if !plan.to_install.is_empty() {
        ui::section(&format!("To install ({})", plan.to_install.len()));
        for def in &plan.to_install {
            match &def.version {
                Some(version) => println!("  {} {} {}", "+".green(), def.id, version.dimmed()),
                None => println!("  {} {}", "+".green(), def.id),
            }
        }
    }

    if !plan.not_found.is_empty() {
        ui::section(&format!("Not found in catalog ({})", plan.not_found.len()));
        for def in &plan.not_found {
            println!("  {} {}", "?".yellow(), def.id);
        }
    }

    if !plan.already_installed.is_empty() {
        if ctx.verbose > 0 {
            ui::section(&format!(
                "Already installed ({})",
                plan.already_installed.len()
            ));
            for def in &plan.already_installed {
                println!("  {} {}", "○".dimmed(), def.id);
            }
        } else {
            println!();
            ui::dim(&format!(
                "{} already installed",
                ui::count(plan.already_installed.len(), "package")
            ));
        }
    }
}

/// Confirm with user
fn confirm_proceed(plan: &SyncPlan) -> Result<bool> {
    use dialoguer::Confirm;

    println!();
    let confirmed = Confirm::new()
        .with_prompt(format!("Apply {}?", ui::count(plan.total_count(), "change")))
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(result: &SyncResult, interrupted: bool) {
    println!();
    println!("  {}", headline(result, interrupted));

    if !result.installed.is_empty() {
        println!("    • {} installed", ui::count(result.installed.len(), "package"));
    }
    if !result.uninstalled.is_empty() {
        println!(
            "    • {} uninstalled",
            ui::count(result.uninstalled.len(), "package")
        );
    }
    if !result.failed.is_empty() {
        println!(
            "    • {} {}",
            ui::count(result.failed.len(), "package"),
            "failed".red()
        );
        for message in &result.errors {
            println!("      {}", message.dimmed());
        }
    }
    if result.reboot_required {
        println!();
        ui::warn("A reboot is required to finish some changes");
    }
}

fn headline(result: &SyncResult, interrupted: bool) -> String {
    if interrupted {
        format!("{} Sync interrupted before finishing", "✗".red().bold())
    } else if result.is_success() {
        format!("{} Packages in sync", "✓".green().bold())
    } else {
        format!("{} Sync finished with errors", "⚠".yellow().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wingetkit::PackageId;

    #[test]
    fn test_headline_never_reports_an_interrupted_run_as_in_sync() {
        let clean = SyncResult::default();
        assert!(headline(&clean, false).contains("Packages in sync"));
        assert!(headline(&clean, true).contains("interrupted"));

        let mut failed = SyncResult {
            failed: vec![PackageId::new("Bad.Pkg")],
            ..SyncResult::default()
        };
        failed.finalize();
        assert!(headline(&failed, false).contains("finished with errors"));
    }
}
