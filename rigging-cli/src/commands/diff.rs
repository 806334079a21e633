//! `rigging diff <project>`: show unified diffs for profiles sync would write.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use rigging_sync::diff::{diff_project, ProfileChange};

use super::{open_project, open_solution};

/// Arguments for `rigging diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Project name to diff.
    pub project: String,
}

impl DiffArgs {
    pub fn run(self, solution: &Path) -> Result<()> {
        let host = open_solution(solution)?;
        let project = open_project(&host, &self.project)?;
        let result = diff_project(&project)
            .with_context(|| format!("diff failed for '{}'", self.project))?;

        if !result.opted_in {
            println!("'{}' has no conandata.yml; nothing is generated.", result.project);
            return Ok(());
        }
        if result.diffs.is_empty() {
            println!("No differences for '{}'.", result.project);
            return Ok(());
        }

        for diff in result.diffs {
            match diff.change {
                ProfileChange::Changed { unified_diff } => {
                    print!("{unified_diff}");
                    if !unified_diff.ends_with('\n') {
                        println!();
                    }
                }
                ProfileChange::UserOwned => println!(
                    "# {} [{}] is user-owned; sync leaves it alone",
                    diff.path.display(),
                    diff.configuration
                ),
                ProfileChange::Failed { reason } => {
                    println!("# {} cannot be translated: {reason}", diff.configuration)
                }
            }
        }

        Ok(())
    }
}
