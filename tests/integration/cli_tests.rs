//! CLI integration tests
//!
//! These tests verify that the respack binary works end to end with its
//! subcommands and global options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Get the path to the fixture res directory
fn fixture_res() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/res")
}

fn respack() -> Command {
    let mut cmd = Command::cargo_bin("respack").unwrap();
    cmd.arg("--quiet");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    Command::cargo_bin("respack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bucketize"))
        .stdout(predicate::str::contains("liteparse"))
        .stdout(predicate::str::contains("zipshard"));
}

#[test]
fn test_version() {
    Command::cargo_bin("respack")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_subcommand() {
    Command::cargo_bin("respack").unwrap().assert().failure();
}

// ============================================================================
// Liteparse
// ============================================================================

#[test]
fn test_liteparse_to_stdout() {
    respack()
        .args(["liteparse", "--pkg", "com.example", "--res-files"])
        .arg(fixture_res().join("values"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"package\": \"com.example\""))
        .stdout(predicate::str::contains("\"name\": \"app_name\""))
        .stdout(predicate::str::contains("\"styleable_attrs\""));
}

#[test]
fn test_liteparse_to_file() {
    let out = TempDir::new().unwrap();
    let json = out.path().join("out/resources.json");
    respack()
        .args(["liteparse", "--res-files"])
        .arg(fixture_res())
        .arg("--out")
        .arg(&json)
        .assert()
        .success();

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    let resources = parsed["resources"].as_array().unwrap();
    assert!(resources
        .iter()
        .any(|r| r["type"] == "layout" && r["name"] == "activity_main"));
}

#[test]
fn test_liteparse_malformed_file() {
    let res = TempDir::new().unwrap();
    let values = res.path().join("res/values");
    fs::create_dir_all(&values).unwrap();
    fs::write(values.join("bad.xml"), "<resources><string>nameless</string></resources>").unwrap();

    respack()
        .args(["liteparse", "--res-files"])
        .arg(res.path().join("res"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Liteparse failed"));
}

// ============================================================================
// Bucketize
// ============================================================================

#[test]
fn test_bucketize() {
    let out = TempDir::new().unwrap();
    let strings = out.path().join("string.zip");
    let layouts = out.path().join("layout.zip");
    respack()
        .args(["bucketize", "--res-paths"])
        .arg(fixture_res())
        .arg("--typed-outputs")
        .arg(format!("string:{}", strings.display()))
        .arg(format!("layout:{}", layouts.display()))
        .assert()
        .success();

    let zip = ZipArchive::new(File::open(&strings).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);
    let mut zip = ZipArchive::new(File::open(&layouts).unwrap()).unwrap();
    assert!(zip.by_name("res/layout/activity_main.xml").is_ok());
}

#[test]
fn test_bucketize_bad_output_spec() {
    respack()
        .args(["bucketize", "--res-paths"])
        .arg(fixture_res())
        .args(["--typed-outputs", "no-type-here.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create output archives"));
}

#[test]
fn test_bucketize_prints_summary() {
    let out = TempDir::new().unwrap();
    Command::cargo_bin("respack")
        .unwrap()
        .args(["bucketize", "--res-paths"])
        .arg(fixture_res())
        .arg("--typed-outputs")
        .arg(format!("raw:{}", out.path().join("raw.zip").display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived"));
}

// ============================================================================
// Zipshard
// ============================================================================

#[test]
fn test_zipshard() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.zip");
    let mut writer = ZipWriter::new(File::create(&input).unwrap());
    for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(name.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    let outputs: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("out-{}.zip", i))).collect();
    respack()
        .arg("zipshard")
        .arg("--input")
        .arg(&input)
        .arg("--outputs")
        .args(&outputs)
        .assert()
        .success();

    let total: usize = outputs
        .iter()
        .map(|p| ZipArchive::new(File::open(p).unwrap()).unwrap().len())
        .sum();
    assert_eq!(total, 5);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_and_workers_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("respack.yml");
    fs::write(&config, "workers: 2\npackage: com.configured\n").unwrap();

    respack()
        .arg("--config")
        .arg(&config)
        .args(["--workers", "3", "liteparse", "--res-files"])
        .arg(fixture_res().join("drawable"))
        .assert()
        .success()
        .stdout(predicate::str::contains("com.configured"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("respack.toml");
    fs::write(&config, "workers = 0\n").unwrap();

    respack()
        .arg("--config")
        .arg(&config)
        .args(["liteparse", "--res-files"])
        .arg(fixture_res().join("drawable"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers"));
}
