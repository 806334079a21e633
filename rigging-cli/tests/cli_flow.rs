use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const APP: &str = "App/App.project.yaml";

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
";

fn rigging_cmd(home: &Path, solution: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rigging"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .arg("--solution")
        .arg(solution);
    cmd
}

fn write_solution(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("App")).expect("mkdir App");
    fs::write(dir.join(APP), APP_YAML).expect("write App");
    let solution = dir.join("solution.yaml");
    fs::write(&solution, format!("projects:\n  - {APP}\n")).expect("write solution");
    solution
}

fn profile(workspace: &Path) -> PathBuf {
    workspace.join("App/.conan/Debug_x64")
}

#[test]
fn init_opts_project_in_and_wires_it() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());

    rigging_cmd(home.path(), &solution)
        .args(["init", APP])
        .assert()
        .success()
        .stdout(contains("conandata.yml"));

    assert!(workspace.path().join("App/conandata.yml").exists());
    assert!(workspace.path().join("App/conanfile.py").exists());
    assert!(workspace.path().join("App/conan/conandeps.props").exists());
    let content = fs::read_to_string(profile(workspace.path())).expect("profile");
    assert!(content.ends_with(
        "[settings]\narch=x86_64\nbuild_type=Debug\ncompiler=msvc\ncompiler.cppstd=17\n\
         compiler.runtime=dynamic\ncompiler.runtime_type=Debug\ncompiler.version=193\nos=Windows\n"
    ));

    let project = fs::read_to_string(workspace.path().join(APP)).expect("project");
    assert!(project.contains("conan/conandeps.props"));
    assert!(project.contains("install . -pr:h=.conan/Debug_x64 --build=missing"));
}

#[test]
fn requirements_round_trip_through_cli() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());
    rigging_cmd(home.path(), &solution).args(["init", APP]).assert().success();

    for reference in ["fmt/10.2.1", "spdlog/1.12.0"] {
        rigging_cmd(home.path(), &solution)
            .args(["require", "add", APP, reference])
            .assert()
            .success()
            .stdout(contains("Added"));
    }
    rigging_cmd(home.path(), &solution)
        .args(["require", "add", APP, "fmt/10.2.1"])
        .assert()
        .success()
        .stdout(contains("already up to date"));
    rigging_cmd(home.path(), &solution)
        .args(["require", "remove", APP, "fmt/10.2.1"])
        .assert()
        .success()
        .stdout(contains("Removed"));

    let assert = rigging_cmd(home.path(), &solution)
        .args(["require", "list", APP])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["spdlog/1.12.0"]);
}

#[test]
fn status_json_reports_profile_and_wiring() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());

    let before = rigging_cmd(home.path(), &solution)
        .args(["status", "--json"])
        .assert()
        .success();
    let payload: serde_json::Value =
        serde_json::from_slice(&before.get_output().stdout).expect("json");
    assert_eq!(payload["projects"][0]["opted_in"], false);
    assert_eq!(payload["projects"][0]["configurations"][0]["profile"], "missing");

    rigging_cmd(home.path(), &solution).args(["init", APP]).assert().success();

    let after = rigging_cmd(home.path(), &solution)
        .args(["status", "--json"])
        .assert()
        .success();
    let payload: serde_json::Value =
        serde_json::from_slice(&after.get_output().stdout).expect("json");
    let project = &payload["projects"][0];
    assert_eq!(project["project"], APP);
    assert_eq!(project["opted_in"], true);
    assert_eq!(project["declaration"], "managed");
    assert_eq!(project["configurations"][0]["profile"], "current");
    assert_eq!(project["configurations"][0]["wired"], true);
}

#[test]
fn diff_shows_pending_profile_change_and_dry_run_writes_nothing() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());
    rigging_cmd(home.path(), &solution).args(["init", APP]).assert().success();

    let manifest = workspace.path().join(APP);
    let edited = fs::read_to_string(&manifest)
        .expect("project")
        .replace("v143", "v142");
    fs::write(&manifest, edited).expect("edit project");

    let assert = rigging_cmd(home.path(), &solution)
        .args(["diff", APP])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.lines().any(|l| l == "+compiler.version=192"), "{stdout}");
    assert!(stdout.lines().any(|l| l == "-compiler.version=193"), "{stdout}");

    rigging_cmd(home.path(), &solution)
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"));
    let content = fs::read_to_string(profile(workspace.path())).expect("profile");
    assert!(content.contains("compiler.version=193\n"), "dry run left profile alone");

    rigging_cmd(home.path(), &solution).args(["sync"]).assert().success();
    let content = fs::read_to_string(profile(workspace.path())).expect("profile");
    assert!(content.contains("compiler.version=192\n"));
}

#[test]
fn event_without_daemon_is_handled_in_process() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());
    fs::write(
        workspace.path().join("App/conandata.yml"),
        rigging_sync::guard::compose("requirements: []\n"),
    )
    .expect("opt in");

    rigging_cmd(home.path(), &solution)
        .args(["event", "config-begin", APP, "Debug", "x64"])
        .assert()
        .success()
        .stdout(contains("profile written"));
    assert!(profile(workspace.path()).exists());

    rigging_cmd(home.path(), &solution)
        .args(["event", "config-done", APP, "Debug", "x64"])
        .assert()
        .success()
        .stdout(contains("wired"));
    let project = fs::read_to_string(workspace.path().join(APP)).expect("project");
    assert!(project.contains("conan/conandeps.props"));

    rigging_cmd(home.path(), &solution)
        .args(["event", "config-begin", APP, "Debug", "ARM"])
        .assert()
        .success()
        .stderr(contains("warning"));
}

#[test]
fn daemon_error_reply_is_only_a_warning() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());

    let runtime = workspace.path().join(".rigging");
    fs::create_dir_all(&runtime).expect("runtime dir");
    let listener = UnixListener::bind(runtime.join("daemon.sock")).expect("bind");
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut request = String::new();
        BufReader::new(&stream).read_line(&mut request).expect("read request");
        (&stream)
            .write_all(b"{\"ok\":false,\"error\":\"channel closed: event queue\"}\n")
            .expect("reply");
        request
    });

    rigging_cmd(home.path(), &solution)
        .args(["event", "build-done"])
        .assert()
        .success()
        .stderr(contains("warning"))
        .stderr(contains("channel closed: event queue"));

    let request = server.join().expect("server thread");
    assert!(request.contains("\"cmd\":\"event\""), "{request}");
}

#[test]
fn user_owned_declaration_is_not_opted_in() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());
    fs::write(workspace.path().join("App/conandata.yml"), "requirements:\n- fmt/10.2.1\n")
        .expect("user declaration");

    rigging_cmd(home.path(), &solution)
        .args(["event", "config-begin", APP, "Debug", "x64"])
        .assert()
        .success()
        .stdout(contains("skipped"));
    assert!(!profile(workspace.path()).exists());

    let assert = rigging_cmd(home.path(), &solution)
        .args(["status", "--json"])
        .assert()
        .success();
    let payload: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json");
    assert_eq!(payload["projects"][0]["opted_in"], false);
    assert_eq!(payload["projects"][0]["declaration"], "user-owned");
}

#[test]
fn configured_executable_is_used_for_wiring() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());

    rigging_cmd(home.path(), &solution)
        .args(["config", "set-conan", "/opt/conan/bin/conan"])
        .assert()
        .success();
    rigging_cmd(home.path(), &solution)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("conan_executable: /opt/conan/bin/conan"));

    rigging_cmd(home.path(), &solution).args(["init", APP]).assert().success();
    let project = fs::read_to_string(workspace.path().join(APP)).expect("project");
    assert!(project.contains("/opt/conan/bin/conan"));
}

#[test]
fn unknown_project_scope_fails() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    let solution = write_solution(workspace.path());

    rigging_cmd(home.path(), &solution)
        .args(["sync", "--project", "Missing/Missing.project.yaml"])
        .assert()
        .failure();
    rigging_cmd(home.path(), &solution)
        .args(["daemon", "status"])
        .assert()
        .success()
        .stdout(contains("\"running\": false"));
}
