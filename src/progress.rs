//! Progress indicators for the pkgsync CLI.

use crate::ui;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{Action, ProgressCallback};
use std::time::Duration;
use wingetkit::{Outcome, PackageId};

const TICK: Duration = Duration::from_millis(100);

/// Start a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(TICK);
    pb
}

/// Spinner that stays hidden in quiet mode
pub fn spinner_unless(quiet: bool, msg: &str) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        spinner(msg)
    }
}

/// Clear a spinner and print an error line
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    ui::error(msg);
}

/// Progress bar for a sync run; prints one line per finished operation
pub struct SyncProgress {
    bar: ProgressBar,
}

impl SyncProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }
}

impl ProgressCallback for SyncProgress {
    fn on_start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(TICK);
    }

    fn on_operation_start(&mut self, action: Action, id: &PackageId) {
        let verb = match action {
            Action::Install => "Installing",
            Action::Uninstall => "Uninstalling",
        };
        self.bar.set_message(format!("{verb} {id}..."));
    }

    fn on_operation_complete(&mut self, action: Action, id: &PackageId, result: Result<Outcome, &str>) {
        let line = match result {
            Ok(outcome) if outcome.reboot_required => format!(
                "  {} {} {} {}",
                "✓".green(),
                action,
                id,
                "(reboot required)".yellow()
            ),
            Ok(_) => format!("  {} {} {}", "✓".green(), action, id),
            Err(reason) => format!("  {} {} {}: {}", "✗".red(), action, id, reason.dimmed()),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_finish(&mut self) {
        self.bar.finish_and_clear();
    }
}
