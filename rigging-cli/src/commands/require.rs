//! `rigging require add|remove|list`

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rigging_sync::{requirements, RequirementChange};

use super::project_dir;

/// Edit a project's `conandata.yml`.
#[derive(Subcommand, Debug)]
pub enum RequireCommand {
    /// Declare a package reference (e.g. "fmt/10.2.1").
    Add(RequirementArgs),

    /// Drop a declared package reference.
    Remove(RequirementArgs),

    /// List declared package references in file order.
    List {
        /// Project name as listed in the solution.
        project: String,
    },
}

#[derive(Args, Debug)]
pub struct RequirementArgs {
    /// Project name as listed in the solution.
    pub project: String,

    /// Package reference, `name/version`.
    pub reference: String,
}

pub fn run(cmd: RequireCommand, solution: &Path) -> Result<()> {
    match cmd {
        RequireCommand::Add(args) => {
            let dir = project_dir(solution, &args.project)?;
            let change = requirements::add_requirement(&dir, &args.reference)
                .with_context(|| format!("failed to add '{}'", args.reference))?;
            report(&args, change);
        }
        RequireCommand::Remove(args) => {
            let dir = project_dir(solution, &args.project)?;
            let change = requirements::remove_requirement(&dir, &args.reference)
                .with_context(|| format!("failed to remove '{}'", args.reference))?;
            report(&args, change);
        }
        RequireCommand::List { project } => {
            let dir = project_dir(solution, &project)?;
            let declared = requirements::list_requirements(&dir);
            if declared.is_empty() {
                println!("No requirements declared for '{project}'.");
            }
            for reference in declared {
                println!("{reference}");
            }
        }
    }
    Ok(())
}

fn report(args: &RequirementArgs, change: RequirementChange) {
    let RequirementArgs { project, reference } = args;
    match change {
        RequirementChange::Added => println!("✓ Added '{reference}' to '{project}'"),
        RequirementChange::Removed => println!("✓ Removed '{reference}' from '{project}'"),
        RequirementChange::Unchanged => println!("· '{project}' already up to date"),
        RequirementChange::NotGuarded => println!(
            "! conandata.yml of '{project}' is user-owned; edit it by hand"
        ),
    }
}
