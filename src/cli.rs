use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use wingetkit::BackendKind;

#[derive(Parser)]
#[command(name = "pkgsync")]
#[command(version)]
#[command(about = "Keep winget packages in sync with a desired-state document", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default: <config dir>/config.toml)
    #[arg(long, global = true, env = "PKGSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Package manager backend: cli or api
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install and uninstall packages until the system matches the document
    Sync(SyncArgs),

    /// Show what sync would do without changing anything
    Plan,

    /// Show the result of the last sync
    Status,

    /// List desired packages and whether they are installed
    List {
        /// List every installed package instead
        #[arg(long)]
        installed: bool,
    },

    /// Install a package and add it to the document
    Install(InstallArgs),

    /// Uninstall a package and mark it for removal in the document
    Uninstall {
        /// Package identifier
        id: String,
    },

    /// Upgrade an installed package
    Upgrade {
        /// Package identifier
        id: String,
    },

    /// Add installed packages missing from the document
    Export {
        /// Pin the currently installed versions
        #[arg(long)]
        include_versions: bool,
    },

    /// Run any winget command with live output
    Exec {
        /// Arguments passed to winget
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Args)]
pub struct SyncArgs {
    /// Show the plan without applying it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// Install
// ============================================================================

#[derive(Args)]
pub struct InstallArgs {
    /// Package identifier
    pub id: String,

    /// Version to install
    #[arg(long)]
    pub version: Option<String>,

    /// Install scope (user or machine)
    #[arg(long)]
    pub scope: Option<String>,

    /// Architecture to select
    #[arg(long)]
    pub architecture: Option<String>,

    /// Installer locale
    #[arg(long)]
    pub locale: Option<String>,

    /// Install location
    #[arg(long)]
    pub location: Option<String>,

    /// Force the install
    #[arg(long)]
    pub force: bool,

    /// Skip package dependencies
    #[arg(long)]
    pub skip_dependencies: bool,

    /// Ignore installer hash mismatches
    #[arg(long)]
    pub allow_hash_mismatch: bool,
}
