//! `rigging status`: per-configuration profile and wiring visibility.

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use rigging_core::{ConfigurationId, ManifestSolution, ProjectHost, ProjectModel};
use rigging_sync::{
    injector,
    profiles::{self, ProfileState},
    requirements,
};

use super::open_solution;

/// Arguments for `rigging status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, solution: &Path) -> Result<()> {
        let host = open_solution(solution)?;
        let report = build_report(&host)?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(solution, report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    projects: Vec<ProjectStatus>,
}

#[derive(Debug, Serialize)]
struct ProjectStatus {
    project: String,
    opted_in: bool,
    declaration: Declaration,
    requirements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    configurations: Vec<ConfigurationStatus>,
}

/// State of the project's `conandata.yml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Declaration {
    Managed,
    UserOwned,
    Missing,
}

impl Declaration {
    fn of(project_dir: &Path) -> Self {
        let path = requirements::declaration_path(project_dir);
        if profiles::is_opted_in(project_dir) {
            Declaration::Managed
        } else if path.exists() {
            Declaration::UserOwned
        } else {
            Declaration::Missing
        }
    }
}

#[derive(Debug, Serialize)]
struct ConfigurationStatus {
    configuration: ConfigurationId,
    profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    wired: bool,
    profile_modified_at: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "configuration")]
    configuration: String,
    #[tabled(rename = "profile")]
    profile: String,
    #[tabled(rename = "wired")]
    wired: String,
    #[tabled(rename = "profile updated")]
    updated: String,
}

fn build_report(host: &ManifestSolution) -> Result<StatusReport> {
    let names = host.project_names().context("failed to list projects")?;
    let projects = names
        .into_iter()
        .map(|name| match host.open_project(&name) {
            Ok(project) => project_status(&project),
            Err(err) => ProjectStatus {
                project: name,
                opted_in: false,
                declaration: Declaration::Missing,
                requirements: 0,
                error: Some(err.to_string()),
                configurations: Vec::new(),
            },
        })
        .collect();
    Ok(StatusReport { projects })
}

fn project_status<P: ProjectModel>(project: &P) -> ProjectStatus {
    let dir = project.directory();
    let declaration = Declaration::of(dir);

    let configurations = project
        .configuration_ids()
        .into_iter()
        .map(|id| {
            let state = profiles::inspect_configuration(project, &id);
            let modified = std::fs::metadata(profiles::profile_path(dir, &id))
                .and_then(|m| m.modified())
                .ok()
                .map(format_mtime);
            ConfigurationStatus {
                profile: state.as_str().to_string(),
                detail: match state {
                    ProfileState::Error(reason) => Some(reason),
                    _ => None,
                },
                wired: injector::is_wired(project, &id),
                profile_modified_at: modified,
                configuration: id,
            }
        })
        .collect();

    ProjectStatus {
        project: project.unique_name().to_string(),
        opted_in: declaration == Declaration::Managed,
        declaration,
        requirements: requirements::list_requirements(dir).len(),
        error: None,
        configurations,
    }
}

fn format_mtime(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn print_table(solution: &Path, report: StatusReport) {
    let opted_in = report.projects.iter().filter(|p| p.opted_in).count();
    println!(
        "Rigging v{} | {} | {} projects | {} opted in",
        env!("CARGO_PKG_VERSION"),
        solution.display(),
        report.projects.len(),
        opted_in,
    );

    if report.projects.is_empty() {
        println!("No projects in solution.");
        return;
    }

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    let mut needs_sync = false;
    for project in report.projects {
        let heading = project.project.bold();
        if let Some(err) = &project.error {
            println!("{heading}  {}", err.red());
            println!("{separator}");
            continue;
        }
        if !project.opted_in {
            let note = match project.declaration {
                Declaration::UserOwned => "not opted in (conandata.yml is user-owned)",
                _ => "not opted in",
            };
            println!("{heading}  {}", note.bright_black());
            println!("{separator}");
            continue;
        }
        println!("{heading}  {} requirement(s)", project.requirements);

        let rows: Vec<StatusTableRow> = project
            .configurations
            .into_iter()
            .map(|c| {
                needs_sync |= matches!(c.profile.as_str(), "stale" | "missing") || !c.wired;
                StatusTableRow {
                    configuration: c.configuration.to_string(),
                    profile: profile_label(&c.profile, c.detail.as_deref()),
                    wired: if c.wired { "yes".green().to_string() } else { "no".yellow().to_string() },
                    updated: c.profile_modified_at.unwrap_or_else(|| "never".to_string()),
                }
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{separator}");
    }

    if needs_sync {
        println!("Run 'rigging sync' to update stale profiles and wiring.");
    }
}

fn profile_label(state: &str, detail: Option<&str>) -> String {
    match state {
        "current" => state.green().to_string(),
        "stale" | "missing" => state.yellow().to_string(),
        "user-owned" => state.magenta().to_string(),
        _ => match detail {
            Some(reason) => format!("{}: {reason}", state.red()),
            None => state.red().to_string(),
        },
    }
}
