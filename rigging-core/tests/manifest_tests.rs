//! Manifest error-message, atomic-write-safety, and fresh-read integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rigging_core::{
    manifest::{save_project_at, SOLUTION_FILE},
    ConfigurationId, ManifestSolution, ModelError, ProjectHost, ProjectModel, ToolchainReader,
};

const PROJECT_YAML: &str = "\
name: App
configurations:
  - configuration: Debug
    platform: x64
    macros:
      PlatformToolset: v143
      MSBuildVersion: \"17.9\"
    runtime_library: MultiThreadedDebugDLL
    language_standard: stdcpp17
  - configuration: Release
    platform: x64
    macros:
      PlatformToolset: v143
      MSBuildVersion: \"17.9\"
    runtime_library: MultiThreadedDLL
    language_standard: stdcpp20
";

fn solution(dir: &assert_fs::TempDir) -> ManifestSolution {
    dir.child("App/App.project.yaml")
        .write_str(PROJECT_YAML)
        .expect("write project");
    dir.child(SOLUTION_FILE)
        .write_str("projects:\n  - App/App.project.yaml\n")
        .expect("write solution");
    ManifestSolution::open(&dir.path().join(SOLUTION_FILE)).expect("open solution")
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_project_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let solution = solution(&dir);
    dir.child("App/App.project.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("corrupt");

    let err = solution.open_project("App/App.project.yaml").unwrap_err();
    assert!(matches!(err, ModelError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("App.project.yaml"));
}

#[test]
fn missing_project_manifest_is_reported_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let solution = solution(&dir);
    std::fs::remove_file(dir.path().join("App/App.project.yaml")).expect("remove");

    let err = solution.open_project("App/App.project.yaml").unwrap_err();
    assert!(matches!(err, ModelError::ManifestNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("manifest not found"));
}

// ---------------------------------------------------------------------------
// 2. Typed access
// ---------------------------------------------------------------------------

#[test]
fn configurations_enumerate_in_manifest_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let project = solution(&dir)
        .open_project("App/App.project.yaml")
        .expect("open");
    assert_eq!(
        project.configuration_ids(),
        vec![
            ConfigurationId::new("Debug", "x64"),
            ConfigurationId::new("Release", "x64"),
        ]
    );

    let release = project
        .toolchain(&ConfigurationId::new("Release", "x64"))
        .expect("release");
    assert_eq!(release.toolset().as_deref(), Some("v143"));
    assert_eq!(release.language_standard(), Some("stdcpp20"));
    assert_eq!(release.runtime_library(), Some("MultiThreadedDLL"));
}

// ---------------------------------------------------------------------------
// 3. Fresh reads and atomic saves
// ---------------------------------------------------------------------------

#[test]
fn open_project_reflects_external_edits() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let solution = solution(&dir);
    let before = solution.open_project("App/App.project.yaml").expect("open");
    assert_eq!(before.configuration_ids().len(), 2);

    let mut manifest = before.manifest.clone();
    manifest.configurations.truncate(1);
    save_project_at(before.path(), &manifest).expect("external edit");

    let after = solution.open_project("App/App.project.yaml").expect("reopen");
    assert_eq!(after.configuration_ids().len(), 1);
}

#[test]
fn save_cleans_up_tmp_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let mut project = solution(&dir)
        .open_project("App/App.project.yaml")
        .expect("open");
    project
        .set_pre_build_command(&ConfigurationId::new("Debug", "x64"), "echo pre")
        .expect("set");
    project.save().expect("save");

    dir.child("App/App.project.yaml.tmp")
        .assert(predicate::path::missing());
    dir.child("App/App.project.yaml")
        .assert(predicate::str::contains("echo pre"));
}
