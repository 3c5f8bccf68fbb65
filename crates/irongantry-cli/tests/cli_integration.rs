//! CLI subprocess integration tests.
//!
//! These tests invoke the `irongantry` binary as a subprocess and verify
//! exit codes, stdout content, and error reporting. Nothing here spawns a
//! real python interpreter: build is only exercised against invalid
//! manifests, where validation fails before any process is spawned.

use std::path::Path;
use std::process::Command;

const MANIFEST_FILE: &str = "IronGantryfile";

fn irongantry_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_irongantry"))
}

fn write_manifest(dir: &Path, content: &str) {
    std::fs::write(dir.join(MANIFEST_FILE), content).unwrap();
}

#[test]
fn version_exits_zero() {
    let output = irongantry_bin().arg("version").output().unwrap();
    assert!(output.status.success(), "version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("irongantry"),
        "version output must contain 'irongantry': {stdout}"
    );
}

#[test]
fn version_json_is_stable() {
    let output = irongantry_bin().args(["--json", "version"]).output().unwrap();
    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON payload");
    assert_eq!(payload["name"], "irongantry");
    assert!(payload["version"].is_string());
}

#[test]
fn help_lists_commands() {
    let output = irongantry_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["init", "build", "run", "ship", "version"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn init_writes_manifest() {
    let project = tempfile::tempdir().unwrap();
    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "init", "demo"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "init must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = std::fs::read_to_string(project.path().join(MANIFEST_FILE)).unwrap();
    assert!(content.contains("project = \"demo\""));
    assert!(content.contains("entrypoint = \"python main.py\""));
}

#[test]
fn init_default_name_is_my_app() {
    let project = tempfile::tempdir().unwrap();
    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "init"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let content = std::fs::read_to_string(project.path().join(MANIFEST_FILE)).unwrap();
    assert!(content.contains("project = \"my_app\""));
}

#[test]
fn init_twice_fails_and_keeps_original() {
    let project = tempfile::tempdir().unwrap();
    let root = project.path().to_string_lossy().into_owned();

    assert!(irongantry_bin()
        .args(["--root", &root, "init", "first"])
        .output()
        .unwrap()
        .status
        .success());
    let original = std::fs::read(project.path().join(MANIFEST_FILE)).unwrap();

    let output = irongantry_bin()
        .args(["--root", &root, "init", "second"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "second init must fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"), "stderr: {stderr}");

    // Byte-for-byte unchanged.
    assert_eq!(
        std::fs::read(project.path().join(MANIFEST_FILE)).unwrap(),
        original
    );
}

#[test]
fn init_rejects_invalid_name() {
    let project = tempfile::tempdir().unwrap();
    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "init", "bad name"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid project name"), "stderr: {stderr}");
    assert!(!project.path().join(MANIFEST_FILE).exists());
}

#[test]
fn build_without_manifest_reports_remedy() {
    let project = tempfile::tempdir().unwrap();
    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "build"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("irongantry init"), "stderr: {stderr}");
}

#[test]
fn build_rejects_unknown_manifest_key() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\npackges = [\"requests\"]\nentrypoint = \"python main.py\"\n",
    );

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "build"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2), "manifest errors exit with 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("packges"), "stderr: {stderr}");
}

#[test]
fn build_rejects_flag_injection_before_any_side_effect() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\npackages = [\"--index-url=http://evil/simple/\"]\nentrypoint = \"python main.py\"\n",
    );

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "build"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must not begin with"), "stderr: {stderr}");
    assert!(
        !project.path().join(".irongantry_env").exists(),
        "validation failure must precede environment creation"
    );
}

#[test]
fn build_rejects_substring_interpreter_match() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\nentrypoint = \"pythonic_app.py main.py\"\n",
    );

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "build"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("must start with 'python' or 'python3'"),
        "stderr: {stderr}"
    );
}

#[test]
fn run_without_environment_reports_remedy() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\nentrypoint = \"python main.py\"\n",
    );

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "run"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("irongantry build"), "stderr: {stderr}");
}

#[test]
fn ship_produces_portable_archive() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\nentrypoint = \"python main.py\"\n",
    );
    std::fs::write(project.path().join("main.py"), "print('hi')\n").unwrap();
    std::fs::create_dir_all(project.path().join(".irongantry_env/bin")).unwrap();
    std::fs::write(project.path().join(".irongantry_env/bin/python"), "x").unwrap();

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "ship"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "ship must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let archive_path = project.path().join("demo_shipped.zip");
    assert!(archive_path.is_file());

    let file = std::fs::File::open(&archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_owned())
        .collect();

    assert!(names.iter().any(|n| n == MANIFEST_FILE));
    assert!(names.iter().any(|n| n == "main.py"));
    assert!(names.iter().any(|n| n == "bootstrap.py"));
    assert!(
        names.iter().all(|n| !n.starts_with(".irongantry_env")),
        "environment directory must be excluded: {names:?}"
    );
}

#[test]
fn ship_json_reports_archive_path() {
    let project = tempfile::tempdir().unwrap();
    write_manifest(
        project.path(),
        "project = \"demo\"\nentrypoint = \"python main.py\"\n",
    );

    let output = irongantry_bin()
        .args(["--root", &project.path().to_string_lossy(), "--json", "ship"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON payload");
    assert_eq!(payload["status"], "shipped");
    let archive = payload["archive"].as_str().expect("archive path");
    assert!(archive.ends_with("demo_shipped.zip"));
}
