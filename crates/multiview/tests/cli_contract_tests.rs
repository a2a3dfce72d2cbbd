//! CLI command contract tests for `mvw`.
//!
//! Runs the binary against a layout file in a temp directory and checks
//! exit codes, stdout shape in plain and `--json` modes, and what ends up
//! on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

// =============================================================================
// Test fixture helpers
// =============================================================================

fn layout_path(dir: &TempDir) -> String {
    dir.path().join("layout.json").to_string_lossy().to_string()
}

/// Build an mvw command bound to the given layout file and workspace.
#[allow(deprecated)]
fn mvw(dir: &TempDir, workspace: &str) -> Command {
    let mut cmd = Command::cargo_bin("mvw").expect("mvw binary should be built");
    cmd.env_remove("MULTIVIEW_CONFIG");
    cmd.env_remove("MULTIVIEW_FILE");
    cmd.env("RUST_LOG", "warn");
    cmd.args(["--file", &layout_path(dir), "--workspace", workspace]);
    cmd
}

fn read_layout(dir: &TempDir) -> Value {
    let text = std::fs::read_to_string(dir.path().join("layout.json")).expect("layout file");
    serde_json::from_str(&text).expect("valid json")
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run mvw");
    assert!(output.status.success(), "mvw failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

// =============================================================================
// list
// =============================================================================

#[test]
fn contract_list_fresh_workspace_shows_fallback() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "sceneA")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("default\tMain Window"));
    // Listing never writes.
    assert!(!dir.path().join("layout.json").exists());
}

#[test]
fn contract_list_json_schema() {
    let dir = TempDir::new().unwrap();
    let value = json_stdout(mvw(&dir, "sceneA").args(["--json", "list"]));
    assert_eq!(
        value,
        json!([{"id": "default", "name": "Main Window", "persistent": true}])
    );
}

// =============================================================================
// create / rename / remove / duplicate / show
// =============================================================================

#[test]
fn contract_create_twice_suffixes_and_persists() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s")
        .args(["create", "Recording Monitor"])
        .assert()
        .success()
        .stdout("recording_monitor\n");
    mvw(&dir, "s")
        .args(["create", "Recording Monitor"])
        .assert()
        .success()
        .stdout("recording_monitor_1\n");

    let layout = read_layout(&dir);
    let ids: Vec<&str> = layout["s"]["multiviews"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(ids, ["default", "recording_monitor", "recording_monitor_1"]);
}

#[test]
fn contract_create_temporary_is_not_written() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s")
        .args(["create", "Temp", "--temporary"])
        .assert()
        .success();
    let layout = read_layout(&dir);
    assert!(layout["s"]["multiviews"].get("temp").is_none());
    mvw(&dir, "s")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("temp").not());
}

#[test]
fn contract_create_blank_name_fails_with_remediation() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s")
        .args(["create", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid multiview name"))
        .stderr(predicate::str::contains("To fix:"));
}

#[test]
fn contract_rename_keeps_id() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s").args(["rename", "default", "Program"]).assert().success();
    let layout = read_layout(&dir);
    assert_eq!(layout["s"]["multiviews"]["default"]["name"], "Program");
}

#[test]
fn contract_remove_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s")
        .args(["remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no multiview with id 'nope'"));
    assert!(!dir.path().join("layout.json").exists());
}

#[test]
fn contract_duplicate_default_name() {
    let dir = TempDir::new().unwrap();
    let value = json_stdout(mvw(&dir, "s").args(["--json", "duplicate", "default"]));
    assert_eq!(value["id"], "main_window_(copy)");
    let layout = read_layout(&dir);
    assert_eq!(
        layout["s"]["multiviews"]["main_window_(copy)"]["name"],
        "Main Window (Copy)"
    );
}

#[test]
fn contract_show_persists_visibility() {
    let dir = TempDir::new().unwrap();
    mvw(&dir, "s").args(["show", "default"]).assert().success();
    assert_eq!(read_layout(&dir)["s"]["multiviews"]["default"]["visible"], true);
}

// =============================================================================
// migrate / inspect / workspaces
// =============================================================================

#[test]
fn contract_migrate_all_rewrites_every_legacy_entry() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("layout.json"),
        json!({"a": [{"w": 1}, {"d": 1}], "b": [{"w": 2}], "c": {"multiviews": {}}}).to_string(),
    )
    .unwrap();

    let value = json_stdout(mvw(&dir, "a").args(["--json", "migrate", "--all"]));
    assert_eq!(value, json!({"migrated": ["a", "b"]}));

    let layout = read_layout(&dir);
    assert_eq!(layout["a"]["dock"], json!({"d": 1}));
    assert_eq!(layout["a"]["multiviews"]["default"]["layout"], json!({"w": 1}));
    assert_eq!(layout["b"]["multiviews"]["default"]["layout"], json!({"w": 2}));
    assert_eq!(layout["c"], json!({"multiviews": {}}));
}

#[test]
fn contract_inspect_prints_entry() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("layout.json"),
        json!({"s": {"multiviews": {"x": {"name": "X"}}}}).to_string(),
    )
    .unwrap();
    let value = json_stdout(mvw(&dir, "s").arg("inspect"));
    assert_eq!(value["multiviews"]["x"]["name"], "X");
}

#[test]
fn contract_workspaces_lists_file_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("layout.json"),
        json!({"zeta": {}, "alpha": []}).to_string(),
    )
    .unwrap();
    mvw(&dir, "zeta")
        .arg("workspaces")
        .assert()
        .success()
        .stdout("zeta\nalpha\n");
}

#[test]
fn contract_no_ansi_on_stdout() {
    let dir = TempDir::new().unwrap();
    let output = mvw(&dir, "s").arg("list").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("\x1b["), "stdout has ANSI escapes: {stdout}");
}
