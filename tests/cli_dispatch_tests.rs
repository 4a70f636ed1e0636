use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_vitrine")
}

const SCHEMA_FIXTURE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/data/datasets/projects.schema.json");

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("vitrine-{name}-{stamp}"));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    dir
}

fn seed_schema(dir: &Path) {
    fs::copy(SCHEMA_FIXTURE, dir.join("projects.schema.json"))
        .expect("schema fixture should copy");
}

fn image(url: &str) -> Value {
    json!({ "url": url, "sourceUrl": format!("https://example.org{url}") })
}

fn project(id: &str, year: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "year": year,
        "images": [
            image(&format!("/img/{id}/a.png")),
            image(&format!("/img/{id}/b.png")),
            image(&format!("/img/{id}/c.png"))
        ]
    })
}

fn write_dataset(dir: &Path, name: &str, projects: &[Value]) {
    let document = json!({ "projects": projects });
    let payload = serde_json::to_string_pretty(&document).expect("dataset should serialize");
    fs::write(dir.join(name), payload).expect("dataset should be written");
}

fn command_in(dir: &Path, program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("VITRINE_DATASETS_DIR", dir)
        .env("VITRINE_SCHEMA_PATH", dir.join("projects.schema.json"))
        .env("VITRINE_OUT_DIR", dir.join("out"));
    cmd
}

#[test]
fn validate_command_prints_ok_summary() {
    let dir = unique_temp_dir("cli-validate-ok");
    seed_schema(&dir);
    write_dataset(
        &dir,
        "works.json",
        &[project("a", 2020, "Atrium"), project("b", 2021, "Bridge")],
    );

    let output = command_in(&dir, bin(), &["validate"])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK: validated 1 dataset file(s), 2 project(s)."));
}

#[test]
fn validate_command_reports_duplicates_on_stderr() {
    let dir = unique_temp_dir("cli-validate-dup");
    seed_schema(&dir);
    write_dataset(&dir, "one.json", &[project("shared", 2020, "First")]);
    write_dataset(&dir, "two.json", &[project("shared", 2021, "Second")]);

    let output = command_in(&dir, bin(), &["validate"])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invariant checks failed:"));
    assert!(stderr.contains("Duplicate project id \"shared\""));
}

#[test]
fn build_command_writes_outputs_and_reports_counts() {
    let dir = unique_temp_dir("cli-build-ok");
    seed_schema(&dir);
    write_dataset(&dir, "works.json", &[project("solo", 2022, "Solo")]);

    let output = command_in(&dir, bin(), &["build"])
        .output()
        .expect("build should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote 1 project(s) from 1 dataset file(s) to:"));
    assert!(dir.join("out").join("projects.index.json").is_file());
    assert!(dir.join("out").join("meta.json").is_file());
}

#[test]
fn build_command_fails_without_datasets() {
    let dir = unique_temp_dir("cli-build-empty");
    seed_schema(&dir);

    let output = command_in(&dir, bin(), &["build"])
        .output()
        .expect("build should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No dataset JSON files found in"));
    assert!(!dir.join("out").exists());
}

#[test]
fn unknown_command_prints_usage() {
    let output = Command::new(bin())
        .arg("serve")
        .output()
        .expect("dispatch should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: vitrine <validate|build|watch>"));
}

#[test]
fn standalone_validate_bin_dispatches() {
    let dir = unique_temp_dir("cli-standalone-validate");
    seed_schema(&dir);
    write_dataset(&dir, "works.json", &[project("solo", 2022, "Solo")]);

    let output = command_in(&dir, env!("CARGO_BIN_EXE_validate_datasets"), &[])
        .output()
        .expect("validate_datasets should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK: validated 1 dataset file(s), 1 project(s)."));
}

#[test]
fn standalone_build_bin_dispatches() {
    let dir = unique_temp_dir("cli-standalone-build");
    seed_schema(&dir);
    write_dataset(&dir, "works.json", &[project("solo", 2022, "Solo")]);

    let output = command_in(&dir, env!("CARGO_BIN_EXE_build_index"), &[])
        .output()
        .expect("build_index should run");

    assert_eq!(output.status.code(), Some(0));
    assert!(dir.join("out").join("projects.index.json").is_file());
}

#[test]
fn shipped_datasets_validate_cleanly() {
    let output = Command::new(bin())
        .arg("validate")
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("VITRINE_DATASETS_DIR")
        .env_remove("VITRINE_SCHEMA_PATH")
        .env_remove("VITRINE_OUT_DIR")
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK: validated 1 dataset file(s), 2 project(s)."));
}
