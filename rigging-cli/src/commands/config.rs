//! `rigging config show|set-conan`

use anyhow::{Context, Result};
use clap::Subcommand;

use rigging_core::settings;

use super::load_settings;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the current settings.
    Show,
    /// Set the package manager executable used by the pre-build step.
    SetConan {
        /// Path to the executable, or a name resolved through PATH.
        path: String,
    },
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let settings = load_settings()?;
            println!("conan_executable: {}", settings.conan_executable);
        }
        ConfigCommand::SetConan { path } => {
            let mut settings = load_settings()?;
            if !settings.set_conan_executable(&path) {
                anyhow::bail!("executable path must not be empty");
            }
            settings::save(&settings).context("failed to save settings")?;
            println!("✓ conan_executable set to {}", settings.conan_executable);
        }
    }
    Ok(())
}
