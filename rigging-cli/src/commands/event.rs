//! `rigging event ...`: report build lifecycle events.
//!
//! Events go to the solution's daemon when one is running. Otherwise they are
//! handled in-process the same way the daemon would handle them. Handling
//! failures are printed as warnings and never fail the calling build step.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rigging_core::{ConfigurationId, ManifestSolution};
use rigging_daemon::lifecycle::{
    on_build_done, on_configuration_build_begin, on_configuration_build_done,
};
use rigging_daemon::paths::solution_root;
use rigging_daemon::{send_event, BuildEvent, DaemonError, OwnerThread};

use super::load_settings;

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// A configuration is about to build.
    ConfigBegin(TargetArgs),
    /// A configuration finished building.
    ConfigDone {
        #[command(flatten)]
        target: TargetArgs,
        /// The build step failed.
        #[arg(long)]
        failed: bool,
    },
    /// The whole build finished.
    BuildDone,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Project name as listed in the solution.
    pub project: String,
    /// Configuration name, e.g. "Debug".
    pub configuration: String,
    /// Platform name, e.g. "x64".
    pub platform: String,
}

impl EventCommand {
    fn into_event(self) -> BuildEvent {
        match self {
            EventCommand::ConfigBegin(t) => BuildEvent::ConfigBegin {
                project: t.project,
                configuration: t.configuration,
                platform: t.platform,
            },
            EventCommand::ConfigDone { target: t, failed } => BuildEvent::ConfigDone {
                project: t.project,
                configuration: t.configuration,
                platform: t.platform,
                success: !failed,
            },
            EventCommand::BuildDone => BuildEvent::BuildDone,
        }
    }
}

pub fn run(command: EventCommand, solution: &Path) -> Result<()> {
    let event = command.into_event();
    let root = solution_root(solution);

    match send_event(&root, event.clone()) {
        Ok(_) => {
            println!("· {} queued on daemon", event.kind());
            return Ok(());
        }
        Err(DaemonError::DaemonNotRunning { .. }) => {}
        Err(err) => {
            eprintln!("warning: {} not delivered to daemon: {err}", event.kind());
            return Ok(());
        }
    }

    if let Err(err) = handle_in_process(solution, &event) {
        eprintln!("warning: {} not handled: {err:#}", event.kind());
    }
    Ok(())
}

fn handle_in_process(solution: &Path, event: &BuildEvent) -> Result<()> {
    let Some((project, id)) = event.target() else {
        on_build_done();
        return Ok(());
    };
    let settings = load_settings()?;
    let path = solution.to_path_buf();
    let owner = OwnerThread::spawn("rigging-host", move || {
        ManifestSolution::open(&path).map_err(DaemonError::from)
    })
    .with_context(|| format!("cannot open solution '{}'", solution.display()))?;

    match event {
        BuildEvent::ConfigDone { success, .. } => {
            match on_configuration_build_done(&owner, &settings, project, &id, *success)? {
                Some(report) if report.saved => println!("✓ {project} [{id}] wired"),
                Some(_) => println!("· {project} [{id}] already wired"),
                None => println!("· '{project}' is not opted in; skipped"),
            }
        }
        _ => report_profile(project, &id, on_configuration_build_begin(&owner, project, &id)?),
    }
    Ok(())
}

fn report_profile(
    project: &str,
    id: &ConfigurationId,
    result: Option<rigging_sync::WriteResult>,
) {
    match result {
        Some(result) if result.is_written() => {
            println!("✓ {project} [{id}] profile written: {}", result.path().display())
        }
        Some(result) => println!("· {project} [{id}] profile: {}", result.path().display()),
        None => println!("· '{project}' is not opted in; skipped"),
    }
}
