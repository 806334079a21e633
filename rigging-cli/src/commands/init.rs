//! `rigging init <project>`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use rigging_sync::{pipeline, WriteResult};

use super::{load_settings, open_solution};
use crate::commands::sync::print_run;

/// Opt a project in.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name as listed in the solution (e.g. "App/App.project.yaml").
    pub project: String,
}

impl InitArgs {
    pub fn run(self, solution: &Path) -> Result<()> {
        let settings = load_settings()?;
        let host = open_solution(solution)?;
        let report = pipeline::init_project(&host, &self.project, &settings)
            .with_context(|| format!("init failed for '{}'", self.project))?;

        match &report.conandata {
            Some(written) => println!("✓ Created {}", written.path().display()),
            None => println!("· Keeping existing declaration file"),
        }
        match &report.conanfile {
            WriteResult::Written { path } => println!("✓ Wrote {}", path.display()),
            WriteResult::NotGuarded { path } => {
                println!("! {} is user-owned; left untouched", path.display())
            }
            other => println!("· {} up to date", other.path().display()),
        }
        print_run(&self.project, &report.run, false);
        Ok(())
    }
}
