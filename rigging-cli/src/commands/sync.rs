//! `rigging sync`: regenerate profiles and wiring.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use rigging_sync::{
    pipeline::{self, SyncScope},
    ProjectRun, WriteResult,
};

use super::{load_settings, open_solution};

/// Arguments for `rigging sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Only sync this project (default: every project in the solution).
    #[arg(long)]
    pub project: Option<String>,

    /// Show what would be written without writing or saving anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, solution: &Path) -> Result<()> {
        let settings = load_settings()?;
        let host = open_solution(solution)?;
        let scope = match self.project.clone() {
            Some(name) => SyncScope::Project(name),
            None => SyncScope::All,
        };

        let results = pipeline::run(&host, &scope, &settings, self.dry_run)
            .context("sync failed")?;
        if results.is_empty() {
            println!("No projects in {}.", solution.display());
        }

        let mut failures = 0;
        for result in &results {
            match &result.outcome {
                Ok(run) => {
                    print_run(&result.project, run, self.dry_run);
                    failures += run.failure_count();
                }
                Err(err) => {
                    println!("{} '{}': {err}", "✗".red(), result.project);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} configuration(s) or project(s) failed to sync");
        }
        Ok(())
    }
}

pub(crate) fn print_run(project: &str, run: &ProjectRun, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if !run.profiles.opted_in {
        println!("{prefix}· '{project}' has no conandata.yml; skipped");
        return;
    }

    let saved = run.injection.as_ref().is_some_and(|i| i.saved);
    println!(
        "{prefix}✓ '{project}' synced ({} profile(s) written{})",
        run.profiles.written(),
        if saved { ", project saved" } else { "" },
    );

    for outcome in &run.profiles.outcomes {
        let id = &outcome.configuration;
        match &outcome.result {
            Ok(WriteResult::Written { path }) => println!("  ✎  {id}  {}", path.display()),
            Ok(WriteResult::WouldWrite { path }) => println!("  ~  {id}  {}", path.display()),
            Ok(WriteResult::Unchanged { path }) => println!("  ·  {id}  {}", path.display()),
            Ok(WriteResult::NotGuarded { path }) => {
                println!("  !  {id}  {} (user-owned)", path.display())
            }
            Err(err) => println!("  {}  {id}  {err}", "✗".red()),
        }
    }

    if let Some(injection) = &run.injection {
        for (id, outcome) in &injection.outcomes {
            match outcome {
                Ok(outcome) if outcome.changed() => {
                    let verb = if dry_run { "would wire" } else { "wired" };
                    println!("  ⚙  {id}  {verb}");
                }
                Ok(_) => {}
                Err(err) => println!("  {}  {id}  wiring: {err}", "✗".red()),
            }
        }
    }
}
