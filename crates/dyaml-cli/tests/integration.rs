//! Integration tests for CLI commands.

use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

const UNSORTED: &str = "name: John\n# account flags\nactive: true\nage: 30\n";
const CANONICAL: &str = "$human$: account flags\nactive: true\nage: 30\nname: John\n";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run_cli_in(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dyaml"))
        .current_dir(dir)
        .env_remove("DYAML_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn run_cli(dir: &TempDir, args: &[&str]) -> (i32, String, String) {
    run_cli_in(dir.path(), args)
}

#[test]
fn test_convert_prints_canonical_text() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", UNSORTED);

    let (code, stdout, _) = run_cli(&dir, &["convert", "config.yaml"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, CANONICAL);
}

#[test]
fn test_convert_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_dyaml"))
        .current_dir(dir.path())
        .arg("convert")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"b: 2\na: 1\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "a: 1\nb: 2\n");
}

#[test]
fn test_convert_strip_annotations() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", UNSORTED);

    let (code, stdout, _) = run_cli(&dir, &["convert", "config.yaml", "--strip-annotations"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "active: true\nage: 30\nname: John\n");
}

#[test]
fn test_convert_multiple_inputs_into_directory() {
    let dir = TempDir::new().unwrap();
    write(&dir, "one.yaml", "b: 1\na: 2\n");
    write(&dir, "two.yml", "- x\n");

    let (code, _, stderr) = run_cli(&dir, &["convert", "one.yaml", "two.yml", "-o", "out"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("one.yaml -> "));
    assert_eq!(
        fs::read_to_string(dir.path().join("out/one.d.yaml")).unwrap(),
        "a: 2\nb: 1\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out/two.d.yaml")).unwrap(),
        "- x\n"
    );
}

#[test]
fn test_convert_multiple_inputs_without_output_is_usage_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "one.yaml", "a: 1\n");
    write(&dir, "two.yaml", "b: 1\n");

    let (code, _, stderr) = run_cli(&dir, &["convert", "one.yaml", "two.yaml"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("--output"));
}

#[test]
fn test_convert_json_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", UNSORTED);

    let (code, stdout, _) = run_cli(&dir, &["convert", "config.yaml", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entry = &parsed[0];
    assert_eq!(entry["file"], "config.yaml");
    assert_eq!(entry["text"], CANONICAL);
    assert_eq!(entry["digest"]["alg"], "sha-256");
    assert_eq!(entry["report"]["status"], "Normalized");
    assert_eq!(entry["report"]["metrics"]["annotations_projected"], 1);
}

#[test]
fn test_missing_file_exits_not_found() {
    let dir = TempDir::new().unwrap();

    let (code, _, stderr) = run_cli(&dir, &["convert", "absent.yaml"]);
    assert_eq!(code, 3);
    assert!(stderr.contains("file not found"));
}

#[test]
fn test_unsupported_construct_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "anchors.yaml", "base: &b 1\ncopy: *b\n");

    let (code, stdout, stderr) = run_cli(&dir, &["convert", "anchors.yaml"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unsupported construct"));
}

#[test]
fn test_malformed_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "broken.yaml", "a: \"unterminated\n");

    let (code, _, stderr) = run_cli(&dir, &["convert", "broken.yaml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("broken.yaml"));
}

#[test]
fn test_validate_canonical_file_passes() {
    let dir = TempDir::new().unwrap();
    write(&dir, "good.yaml", CANONICAL);

    let (code, stdout, _) = run_cli(&dir, &["validate", "good.yaml"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("[PASS] good.yaml"));
}

#[test]
fn test_validate_reports_findings() {
    let dir = TempDir::new().unwrap();
    write(&dir, "bad.yaml", "name: John\nactive: true\n");

    let (code, stdout, _) = run_cli(&dir, &["validate", "bad.yaml"]);
    assert_eq!(code, 1);
    assert!(stdout.starts_with("[FAIL] bad.yaml"));
    assert!(stdout.contains("KeyOrder"));
}

#[test]
fn test_validate_json_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "good.yaml", CANONICAL);
    write(&dir, "bad.yaml", "name: John\nactive: true\n");
    write(&dir, "broken.yaml", "a: [1, 2\n");

    let (code, stdout, _) = run_cli(
        &dir,
        &["validate", "good.yaml", "bad.yaml", "broken.yaml", "--json"],
    );
    assert_eq!(code, 1);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["valid"], false);

    let files = parsed["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0], json!({"file": "good.yaml", "valid": true, "findings": []}));
    assert_eq!(files[1]["valid"], false);
    assert!(files[1]["findings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["code"] == "KeyOrder" && f["severity"] == "error"));
    assert_eq!(files[2]["valid"], false);
    assert!(files[2]["error"].is_string());
    assert!(files[2].get("findings").is_none());
}

#[test]
fn test_validate_multiple_files_prints_summary() {
    let dir = TempDir::new().unwrap();
    write(&dir, "good.yaml", CANONICAL);
    write(&dir, "bad.yaml", "name: John\nactive: true\n");

    let (code, stdout, _) = run_cli(&dir, &["validate", "good.yaml", "bad.yaml"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("FILE"));
    assert!(stdout.contains("STATUS"));
    assert!(stdout.contains("invalid"));
}

#[test]
fn test_validate_requires_files() {
    let dir = TempDir::new().unwrap();

    let (code, _, _) = run_cli(&dir, &["validate"]);
    assert_eq!(code, 2);
}

#[test]
fn test_normalize_check_and_in_place() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.yaml", UNSORTED);

    let (code, stdout, _) = run_cli(&dir, &["normalize", "--check", "config.yaml"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("config.yaml: not normalized"));
    assert_eq!(fs::read_to_string(&path).unwrap(), UNSORTED);

    let (code, _, _) = run_cli(&dir, &["normalize", "--in-place", "config.yaml"]);
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), CANONICAL);

    let (code, stdout, _) = run_cli(&dir, &["normalize", "--check", "config.yaml"]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn test_normalize_prints_headers_for_multiple_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.yaml", "y: 1\nx: 2\n");
    write(&dir, "b.yaml", "k: v\n");

    let (code, stdout, _) = run_cli(&dir, &["normalize", "a.yaml", "b.yaml"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "# a.yaml\nx: 2\ny: 1\n# b.yaml\nk: v\n");
}

#[test]
fn test_normalize_check_conflicts_with_in_place() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", UNSORTED);

    let (code, _, _) = run_cli(&dir, &["normalize", "--check", "--in-place", "config.yaml"]);
    assert_eq!(code, 2);
}

#[test]
fn test_diff_reports_changes() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.yaml", "workers: 50\nregion: eu\n");
    write(&dir, "b.yaml", "region: eu\nworkers: 100\nzone: b\n");

    let (code, stdout, _) = run_cli(&dir, &["diff", "a.yaml", "b.yaml"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("[CHANGED] workers: 50 -> 100"));
    assert!(stdout.contains("[ADDED] zone: b"));
}

#[test]
fn test_diff_identical_documents() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.yaml", "a: 1\nb: [x, y]\n");
    write(&dir, "b.yaml", "b:\n  - x\n  - y\na: 1\n");

    let (code, stdout, _) = run_cli(&dir, &["diff", "a.yaml", "b.yaml"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "No differences.");
}

#[test]
fn test_diff_ignores_annotations_on_request() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.yaml", "# old note\nport: 80\n");
    write(&dir, "b.yaml", "# new note\nport: 80\n");

    let (code, stdout, _) = run_cli(&dir, &["diff", "a.yaml", "b.yaml", "--json"]);
    assert_eq!(code, 1);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["path"], "$human$");
    assert_eq!(parsed[0]["isAnnotation"], true);

    let (code, _, _) = run_cli(&dir, &["diff", "a.yaml", "b.yaml", "--no-annotations"]);
    assert_eq!(code, 0);
}

#[test]
fn test_check_drift_is_advisory() {
    let dir = TempDir::new().unwrap();
    write(&dir, "base.yaml", "# Max 50 due to memory constraints\nworkers: 50\n");
    write(&dir, "new.yaml", "# Max 50 due to memory constraints\nworkers: 100\n");

    let (code, stdout, _) = run_cli(&dir, &["check-drift", "new.yaml", "base.yaml"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[CHANGED] workers: 50 -> 100"));
    assert!(stdout.contains("contradicts annotation"));

    let (code, _, _) = run_cli(
        &dir,
        &["check-drift", "new.yaml", "base.yaml", "--fail-on-contradiction"],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_check_drift_json_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "base.yaml", "# Max 50\nworkers: 50\n");
    write(&dir, "new.yaml", "# Max 50\nworkers: 100\n");

    let (code, stdout, _) = run_cli(&dir, &["check-drift", "new.yaml", "base.yaml", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let finding = &parsed[0];
    assert_eq!(finding["path"], "workers");
    assert_eq!(finding["kind"], "changed");
    assert_eq!(finding["contradictsAnnotation"], true);
    assert_eq!(finding["reason"], "upper_bound");
    assert_eq!(finding["annotationText"], "Max 50");
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    write(&dir, "dyaml.toml", "preserve_annotations = false\njson = true\n");
    write(&dir, "config.yaml", UNSORTED);

    let (code, stdout, _) = run_cli(&dir, &["convert", "config.yaml"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["text"], "active: true\nage: 30\nname: John\n");
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "custom.toml", "unknown_setting = 1\n");
    write(&dir, "config.yaml", CANONICAL);

    let (code, _, stderr) = run_cli(&dir, &["--config", "custom.toml", "validate", "config.yaml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid configuration"));
}

#[test]
fn test_convert_in_place_writes_beside_inputs() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "config.yaml", UNSORTED);
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(&dir, "sub/other.yml", "b: 1\na: 2\n");

    let (code, stdout, _) = run_cli(&dir, &["convert", "--in-place", "config.yaml", "sub/other.yml"]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert_eq!(fs::read_to_string(&source).unwrap(), UNSORTED);
    assert_eq!(
        fs::read_to_string(dir.path().join("config.d.yaml")).unwrap(),
        CANONICAL
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("sub/other.d.yaml")).unwrap(),
        "a: 2\nb: 1\n"
    );
}

#[test]
fn test_convert_in_place_conflicts_with_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.yaml", UNSORTED);

    let (code, _, _) = run_cli(&dir, &["convert", "--in-place", "-o", "out.yaml", "config.yaml"]);
    assert_eq!(code, 2);
    assert!(!dir.path().join("config.d.yaml").exists());
}
