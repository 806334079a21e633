use std::fs;
use std::path::Path;

use filetime::{set_file_mtime, FileTime};
use rigging_core::{
    manifest::SOLUTION_FILE, ConfigurationId, ManifestSolution, ProjectHost, ProjectModel,
    Settings,
};
use rigging_sync::{
    guard::{self, GUARD_BANNER},
    injector, pipeline, profiles, requirements, SyncError, SyncScope, WriteResult,
};
use tempfile::TempDir;

const APP: &str = "App/App.project.yaml";
const TOOLS: &str = "Tools/Tools.project.yaml";

const APP_YAML: &str = "\
name: App
configurations:
  - configuration: Debug
    platform: x64
    macros:
      PlatformToolset: v143
      MSBuildVersion: \"17.9\"
    runtime_library: MultiThreadedDebugDLL
    language_standard: stdcpp17
    pre_build_command: echo prepare
  - configuration: Release
    platform: x64
    macros:
      PlatformToolset: v143
      MSBuildVersion: \"17.10\"
    runtime_library: MultiThreadedDLL
    language_standard: stdcpp20
  - configuration: Debug
    platform: ARM
    macros:
      PlatformToolset: v143
      MSBuildVersion: \"17.9\"
    runtime_library: MultiThreadedDebugDLL
";

const TOOLS_YAML: &str = "\
name: Tools
configurations:
  - configuration: Release
    platform: Win32
    macros:
      PlatformToolset: v141
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn solution(dir: &Path) -> ManifestSolution {
    fs::create_dir_all(dir.join("App")).expect("mkdir App");
    fs::create_dir_all(dir.join("Tools")).expect("mkdir Tools");
    fs::write(dir.join(APP), APP_YAML).expect("write App");
    fs::write(dir.join(TOOLS), TOOLS_YAML).expect("write Tools");
    fs::write(
        dir.join(SOLUTION_FILE),
        format!("projects:\n  - {APP}\n  - {TOOLS}\n"),
    )
    .expect("write solution");
    ManifestSolution::open(&dir.join(SOLUTION_FILE)).expect("open")
}

fn read_profile(dir: &Path, configuration: &str, platform: &str) -> String {
    let path = profiles::profile_path(&dir.join("App"), &ConfigurationId::new(configuration, platform));
    fs::read_to_string(path).expect("profile")
}

#[test]
fn init_writes_profiles_and_wires_every_configuration() {
    init_logging();
    let dir = TempDir::new().expect("dir");
    let solution = solution(dir.path());

    let report = pipeline::init_project(&solution, APP, &Settings::default()).expect("init");
    assert!(matches!(report.conandata, Some(WriteResult::Written { .. })));
    assert!(report.conanfile.is_written());
    assert_eq!(report.run.profiles.written(), 2);

    let debug = read_profile(dir.path(), "Debug", "x64");
    assert_eq!(
        debug,
        format!(
            "{}\n{}\n[settings]\narch=x86_64\nbuild_type=Debug\ncompiler=msvc\ncompiler.cppstd=17\n\
             compiler.runtime=dynamic\ncompiler.runtime_type=Debug\ncompiler.version=193\nos=Windows\n",
            GUARD_BANNER[0], GUARD_BANNER[1]
        )
    );
    let release = read_profile(dir.path(), "Release", "x64");
    assert!(release.contains("compiler.version=194\n"));
    assert!(release.contains("compiler.cppstd=20\n"));

    let arm = profiles::profile_path(&dir.path().join("App"), &ConfigurationId::new("Debug", "ARM"));
    assert!(!arm.exists(), "unsupported platform writes nothing");

    let project = solution.open_project(APP).expect("reopen");
    for id in project.configuration_ids() {
        assert!(injector::is_wired(&project, &id), "{id} not wired");
    }
    let debug_id = ConfigurationId::new("Debug", "x64");
    assert_eq!(
        project.pre_build_command(&debug_id),
        Some("\"conan\" install . -pr:h=.conan/Debug_x64 --build=missing\necho prepare")
    );
}

#[test]
fn second_run_rewrites_nothing() {
    init_logging();
    let dir = TempDir::new().expect("dir");
    let solution = solution(dir.path());
    pipeline::init_project(&solution, APP, &Settings::default()).expect("init");

    let project_file = dir.path().join(APP);
    let profile = profiles::profile_path(&dir.path().join("App"), &ConfigurationId::new("Debug", "x64"));
    let old = FileTime::from_unix_time(1_000_000, 0);
    set_file_mtime(&project_file, old).expect("mtime");
    set_file_mtime(&profile, old).expect("mtime");

    let results = pipeline::run(&solution, &SyncScope::All, &Settings::default(), false).expect("run");
    assert_eq!(results.len(), 2);

    let app = results[0].outcome.as_ref().expect("App synced");
    assert_eq!(app.profiles.written(), 0);
    assert!(!app.injection.as_ref().expect("opted in").saved);

    let tools = results[1].outcome.as_ref().expect("Tools synced");
    assert!(!tools.profiles.opted_in);
    assert!(tools.injection.is_none());

    let mtime = |p: &Path| FileTime::from_last_modification_time(&fs::metadata(p).expect("meta"));
    assert_eq!(mtime(&project_file), old, "project not saved without changes");
    assert_eq!(mtime(&profile), old, "profile not rewritten");
}

#[test]
fn requirement_edits_keep_banner_and_order() {
    let dir = TempDir::new().expect("dir");
    let project_dir = dir.path().join("App");
    fs::create_dir_all(&project_dir).expect("mkdir");
    fs::write(
        requirements::declaration_path(&project_dir),
        format!("{}\n{}\nrequirements: [fmt/10.2.1]\n", GUARD_BANNER[0], GUARD_BANNER[1]),
    )
    .expect("write");

    requirements::add_requirement(&project_dir, "spdlog/1.12.0").expect("add");
    assert!(guard::is_guarded(&requirements::declaration_path(&project_dir)).expect("guarded"));
    assert_eq!(
        requirements::list_requirements(&project_dir),
        vec!["fmt/10.2.1".to_string(), "spdlog/1.12.0".to_string()]
    );
}

#[test]
fn unknown_project_scope_is_rejected() {
    let dir = TempDir::new().expect("dir");
    let solution = solution(dir.path());
    let err = pipeline::run(
        &solution,
        &SyncScope::Project("Missing/Missing.project.yaml".to_string()),
        &Settings::default(),
        false,
    )
    .expect_err("unknown project");
    assert!(matches!(err, SyncError::ProjectModelUnavailable { .. }), "got: {err}");
}
