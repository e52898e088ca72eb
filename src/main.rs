mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod state;
mod store;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use wingetkit::CancelToken;

/// Exit code for a run stopped by Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub settings: config::Settings,
    /// Cancelled by the Ctrl-C handler
    pub cancel: CancelToken,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "pkgsync", &mut io::stdout());
        return Ok(());
    }

    let mut settings = config::Settings::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        settings,
        cancel,
    };

    let result = match cli.command {
        Command::Sync(args) => commands::sync::run(&ctx, args.dry_run, args.yes),
        Command::Plan => commands::sync::run(&ctx, true, true),
        Command::Status => commands::status::run(&ctx),
        Command::List { installed } => commands::list::run(&ctx, installed),
        Command::Install(args) => commands::packages::install(&ctx, args),
        Command::Uninstall { id } => commands::packages::uninstall(&ctx, &id),
        Command::Upgrade { id } => commands::packages::upgrade(&ctx, &id),
        Command::Export { include_versions } => commands::export::run(&ctx, include_versions),
        Command::Exec { args } => commands::exec::run(&ctx, &args),
        Command::Completions { .. } => Ok(0),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) if commands::is_cancelled(&e) => {
            ui::warn("Cancelled");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            if let Some(err) = e.chain().find_map(|c| c.downcast_ref::<wingetkit::Error>()) {
                let category = err.category();
                log::debug!("{}: {err}", category.description());
                ui::dim(category.advice());
            }
            return Err(e);
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
