//! Rigging: keeps Conan profiles and build wiring in step with a solution.
//!
//! # Usage
//!
//! ```text
//! rigging [--solution <path>] init <project>
//! rigging require add|remove <project> <reference>
//! rigging require list <project>
//! rigging sync [--project <name>] [--dry-run]
//! rigging diff <project>
//! rigging status [--json]
//! rigging config show|set-conan <path>
//! rigging daemon start|stop|status
//! rigging event config-begin|config-done|build-done ...
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, daemon::DaemonCommand, diff::DiffArgs, event::EventCommand,
    init::InitArgs, require::RequireCommand, status::StatusArgs, sync::SyncArgs,
};
use rigging_core::manifest::SOLUTION_FILE;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rigging",
    version,
    about = "Keep Conan profiles and build wiring in step with your build configurations",
    long_about = None,
)]
struct Cli {
    /// Solution manifest to operate on.
    #[arg(long, global = true, default_value = SOLUTION_FILE)]
    solution: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Opt a project in: declaration file, recipe, profiles and wiring.
    Init(InitArgs),

    /// Edit a project's declared package requirements.
    Require {
        #[command(subcommand)]
        command: RequireCommand,
    },

    /// Regenerate profiles and wiring for the solution or one project.
    Sync(SyncArgs),

    /// Show unified diff of the profiles sync would rewrite.
    Diff(DiffArgs),

    /// Show per-configuration profile and wiring state.
    Status(StatusArgs),

    /// Show or change user settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Run or control the build lifecycle daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },

    /// Report a build lifecycle event (for IDE and MSBuild hooks).
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let solution = cli.solution;
    match cli.command {
        Commands::Init(args) => args.run(&solution),
        Commands::Require { command } => commands::require::run(command, &solution),
        Commands::Sync(args) => args.run(&solution),
        Commands::Diff(args) => args.run(&solution),
        Commands::Status(args) => args.run(&solution),
        Commands::Config { command } => commands::config::run(command),
        Commands::Daemon { command } => commands::daemon::run(command, &solution),
        Commands::Event { command } => commands::event::run(command, &solution),
    }
}
