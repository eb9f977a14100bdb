//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build command for the boardfile-cli binary (finds it in target/debug when run via cargo test).
fn boardfile_cli() -> Command {
    cargo_bin_cmd!("boardfile-cli")
}

/// Path to boardfile library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("boardfile")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = boardfile_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("KiCad"));
}

#[test]
fn test_cli_version() {
    let mut cmd = boardfile_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_info_human() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("legacy_two_layer.brd");

    cmd.arg("info").arg(path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("legacy board"))
        .stdout(predicate::str::contains("footprints:"));
}

#[test]
fn test_cli_info_json() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("sensor_node.kicad_pcb");

    cmd.arg("info").arg(path).arg("--format").arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("Output should be valid JSON");

    assert_eq!(json["format"], "board");
    assert_eq!(json["version"], 20211014);
    assert_eq!(json["copper_layers"], 2);
    assert_eq!(json["footprints"], 2);
    assert_eq!(json["vias"], 1);
    assert_eq!(json["tracks"], 3);
    assert_eq!(json["groups"], 1);
}

#[test]
fn test_cli_info_footprint() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("pin_header.kicad_mod");

    cmd.arg("info").arg(path).arg("-f").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PinHeader_1x03_P2.54mm_Vertical"));
}

#[test]
fn test_cli_check_clean_file() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("sensor_node.kicad_pcb");

    cmd.arg("check").arg(path).arg("--deny-warnings");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn test_cli_check_future_version() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("future_version.kicad_pcb");

    cmd.arg("check").arg(path);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("99999999"));
}

#[test]
fn test_cli_check_missing_file() {
    let mut cmd = boardfile_cli();

    cmd.arg("check").arg("nonexistent.kicad_pcb");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_cli_check_deny_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mystery.kicad_pcb");
    let text = std::fs::read_to_string(fixtures_dir().join("sensor_node.kicad_pcb")).unwrap();
    let end = text.rfind(')').unwrap();
    let text = format!(
        "{}  (gr_line (start 0 0) (end 5 0) (layer \"Mystery\") (width 0.1))\n)\n",
        &text[..end]
    );
    std::fs::write(&path, text).unwrap();

    let mut cmd = boardfile_cli();
    cmd.arg("check").arg(&path).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("undefined_layer"));

    let mut cmd = boardfile_cli();
    cmd.arg("check").arg(&path).arg("--deny-warnings");
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("Mystery"));

    let mut cmd = boardfile_cli();
    cmd.arg("check")
        .arg(&path)
        .arg("--undefined-layers")
        .arg("abort");
    cmd.assert().code(1);
}

#[test]
fn test_cli_convert_legacy_board() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("converted.kicad_pcb");

    let mut cmd = boardfile_cli();
    cmd.arg("convert")
        .arg(fixtures_dir().join("legacy_two_layer.brd"))
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Converted"));

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("(kicad_pcb (version 20211014)"));

    let mut cmd = boardfile_cli();
    cmd.arg("info").arg(&out).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"footprints\": 1"));
}

#[test]
fn test_cli_layers() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("sensor_node.kicad_pcb");

    cmd.arg("layers").arg(path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Ground"))
        .stdout(predicate::str::contains("Edge.Cuts"));
}

#[test]
fn test_cli_layers_rejects_footprint() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("pin_header.kicad_mod");

    cmd.arg("layers").arg(path);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not a board"));
}

#[test]
fn test_cli_verbose_logs_to_stderr() {
    let mut cmd = boardfile_cli();
    let path = fixtures_dir().join("legacy_mm.brd");

    cmd.arg("-v").arg("info").arg(path).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("loaded"));
}
