use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "config/datasource.yaml",
        "datasource:\n  urls:\n    /home:\n      - config/home.yaml\n      - config/missing.yaml\n",
    );
    write(
        dir.path(),
        "config/home.yaml",
        r#"
actions:
  - type: remove
    selector: ".ad"
    priority: 1
  - type: replace
    selector: h1
    newElement: "<h1>Welcome</h1>"
"#,
    );
    write(
        dir.path(),
        "config/broken.yaml",
        "actions:\n  - type: insert\n    target: '#nowhere'\n    element: <i></i>\n    position: after\n",
    );
    write(
        dir.path(),
        "page.html",
        "<html><body><h1>Hi</h1><div class=\"ad\">buy</div></body></html>",
    );
    dir
}

fn dompatch(dir: &TempDir) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("dompatch");
    let mut cmd = Command::new(bin);
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("DOMPATCH_DATASOURCE")
        .env_remove("DOMPATCH_BASE_URL")
        .args(["--settings", "absent.yaml"]);
    cmd
}

#[test]
fn patch_writes_patched_html_to_stdout() {
    let dir = site();
    let assert = dompatch(&dir)
        .args(["patch", "--input", "page.html", "--location", "/home"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout, "<html><body><h1>Welcome</h1></body></html>");
}

#[test]
fn patch_writes_output_and_report_files() {
    let dir = site();
    dompatch(&dir)
        .args([
            "patch",
            "--input",
            "page.html",
            "--config",
            "config/home.yaml",
            "--output",
            "out.html",
            "--report",
            "report.json",
        ])
        .assert()
        .success();

    let html = fs::read_to_string(dir.path().join("out.html")).unwrap();
    assert_eq!(html, "<html><body><h1>Welcome</h1></body></html>");

    let report: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["kind"], "replace");
    assert_eq!(steps[1]["outcome"]["status"], "applied");
}

#[test]
fn strict_patch_fails_on_action_errors() {
    let dir = site();
    let assert = dompatch(&dir)
        .args([
            "patch",
            "--input",
            "page.html",
            "--config",
            "config/broken.yaml",
            "--strict",
        ])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("<h1>Hi</h1>"));

    dompatch(&dir)
        .args(["patch", "--input", "page.html", "--config", "config/broken.yaml"])
        .assert()
        .success();
}

#[test]
fn resolve_lists_identifiers() {
    let dir = site();
    let assert = dompatch(&dir)
        .args(["--format", "json", "resolve", "--location", "/home"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let identifiers: Vec<String> = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(identifiers, vec!["config/home.yaml", "config/missing.yaml"]);
}

#[test]
fn check_prints_plan_in_dispatch_order() {
    let dir = site();
    let assert = dompatch(&dir)
        .args(["--format", "json", "check", "--config", "config/home.yaml"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: Value = serde_json::from_str(stdout.trim()).unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps[0]["action"]["type"], "replace");
    assert_eq!(steps[1]["action"]["type"], "remove");
    assert_eq!(steps[1]["priority"].as_f64(), Some(1.0));
}

#[test]
fn check_fails_when_a_configuration_is_missing() {
    let dir = site();
    dompatch(&dir)
        .args(["check", "--location", "/home"])
        .assert()
        .failure();

    dompatch(&dir)
        .args(["check", "--location", "/home", "--allow-missing"])
        .assert()
        .success();
}
