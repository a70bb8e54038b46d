//! CLI integration tests for Clipchain
//!
//! These tests cover the full flow from folder initialization through
//! running pipelines and inspecting the session log.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the clipchain binary
fn clipchain_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("clipchain"))
}

/// Create a temporary directory seeded with the starter transforms
fn setup_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    clipchain_cmd()
        .args(["init", "-t"])
        .arg(dir.path())
        .assert()
        .success();
    dir
}

/// Point the folder's settings at a database inside the temp dir so tests
/// never touch the real user data directory.
fn isolate_database(dir: &TempDir) {
    let db = dir.path().join("log.db");
    fs::write(
        dir.path().join("clipchain.toml"),
        format!("database = \"{}\"\n", db.display()),
    )
    .unwrap();
}

fn write_script(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_starter_files() {
    let dir = TempDir::new().unwrap();

    clipchain_cmd()
        .args(["init", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(dir.path().join("upper.rhai").is_file());
    assert!(dir.path().join("trim_whitespace.rhai").is_file());
    assert!(dir.path().join("transforms.ini").is_file());
    assert!(dir.path().join("clipchain.toml").is_file());
}

#[test]
fn test_init_skips_existing_files() {
    let dir = setup_folder();

    // Customize one starter, re-init, and check it survived.
    write_script(dir.path(), "upper.rhai", "// Mine.\nfn transform(text) { text }\n");

    clipchain_cmd()
        .args(["init", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));

    let body = fs::read_to_string(dir.path().join("upper.rhai")).unwrap();
    assert!(body.contains("Mine."));
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_shows_transforms_and_chains() {
    let dir = setup_folder();

    clipchain_cmd()
        .args(["list", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Upper"))
        .stdout(predicate::str::contains("Trim Whitespace"))
        .stdout(predicate::str::contains("⛓ Clean Shout"))
        .stdout(predicate::str::contains("trim_whitespace → upper"));
}

#[test]
fn test_list_marks_broken_scripts() {
    let dir = setup_folder();
    write_script(dir.path(), "busted.rhai", "fn transform(text) { text.\n");

    clipchain_cmd()
        .args(["list", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("⚠ busted"))
        .stdout(predicate::str::contains("Load error:"))
        .stdout(predicate::str::contains("1 failed to load"));
}

#[test]
fn test_list_skips_underscore_files() {
    let dir = setup_folder();
    write_script(dir.path(), "_shared.rhai", "fn transform(text) { text }\n");

    clipchain_cmd()
        .args(["list", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Shared").not());
}

#[test]
fn test_list_is_deterministic() {
    let dir = setup_folder();

    let run_once = || {
        let output = clipchain_cmd()
            .args(["list", "--format", "json", "-t"])
            .arg(dir.path())
            .assert()
            .success();
        String::from_utf8_lossy(&output.get_output().stdout).into_owned()
    };

    assert_eq!(run_once(), run_once());
}

// =============================================================================
// Run Tests
// =============================================================================

#[test]
fn test_run_single_transform_from_stdin() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "upper", "-t"])
        .arg(dir.path())
        .write_stdin("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("HELLO"));
}

#[test]
fn test_run_chain_composes_steps() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "clean_shout", "-t"])
        .arg(dir.path())
        .write_stdin("  hello world  ")
        .assert()
        .success()
        .stdout(predicate::str::contains("HELLO WORLD"));
}

#[test]
fn test_run_ad_hoc_steps() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "--steps", "trim_whitespace,lower", "-t"])
        .arg(dir.path())
        .write_stdin("  SHOUTING  ")
        .assert()
        .success()
        .stdout(predicate::str::contains("shouting"));
}

#[test]
fn test_run_reads_input_file() {
    let dir = setup_folder();
    isolate_database(&dir);
    let input = dir.path().join("input.txt");
    fs::write(&input, "from a file").unwrap();

    clipchain_cmd()
        .args(["run", "upper", "-t"])
        .arg(dir.path())
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM A FILE"));
}

#[test]
fn test_run_applies_ini_overrides() {
    let dir = setup_folder();
    isolate_database(&dir);

    // The starter transforms.ini overrides prefix_lines' marker to ">>".
    clipchain_cmd()
        .args(["run", "prefix_lines", "-t"])
        .arg(dir.path())
        .write_stdin("one\ntwo")
        .assert()
        .success()
        .stdout(predicate::str::contains(">>one"))
        .stdout(predicate::str::contains(">>two"));
}

#[test]
fn test_run_unknown_name_fails() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "does_not_exist", "-t"])
        .arg(dir.path())
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist"));
}

#[test]
fn test_run_chain_with_missing_step_names_it() {
    let dir = setup_folder();
    isolate_database(&dir);
    fs::write(
        dir.path().join("transforms.ini"),
        "[chain:dangling]\ndescription = refers to a missing script\nsteps = upper, vanished\n",
    )
    .unwrap();

    clipchain_cmd()
        .args(["run", "dangling", "-t"])
        .arg(dir.path())
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("vanished"));
}

#[test]
fn test_run_broken_script_reports_load_error() {
    let dir = setup_folder();
    isolate_database(&dir);
    write_script(dir.path(), "busted.rhai", "fn transform(text) { text.\n");

    clipchain_cmd()
        .args(["run", "busted", "-t"])
        .arg(dir.path())
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

#[test]
fn test_run_script_runtime_error_fails_without_output() {
    let dir = setup_folder();
    isolate_database(&dir);
    write_script(
        dir.path(),
        "raise.rhai",
        "fn transform(text) { throw \"deliberate\"; }\n",
    );

    clipchain_cmd()
        .args(["run", "--steps", "upper,raise", "-t"])
        .arg(dir.path())
        .write_stdin("partial")
        .assert()
        .failure()
        // The uppercased intermediate never reaches stdout.
        .stdout(predicate::str::contains("PARTIAL").not())
        .stderr(predicate::str::contains("raise"));
}

#[test]
fn test_run_json_output() {
    let dir = setup_folder();
    isolate_database(&dir);

    let output = clipchain_cmd()
        .args(["run", "upper", "--format", "json", "-t"])
        .arg(dir.path())
        .write_stdin("hi")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["output"], "HI");
    assert_eq!(json["chars"], 2);
    assert_eq!(json["steps"], 1);
}

// =============================================================================
// Log Tests
// =============================================================================

#[test]
fn test_runs_are_logged() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "clean_shout", "-t"])
        .arg(dir.path())
        .write_stdin("logged run")
        .assert()
        .success();

    clipchain_cmd()
        .args(["log", "show", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Chain"))
        .stdout(predicate::str::contains("trim_whitespace"));

    clipchain_cmd()
        .args(["log", "sessions", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(dir.path().to_string_lossy().as_ref()));
}

#[test]
fn test_log_show_filters_by_tag() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["run", "upper", "-t"])
        .arg(dir.path())
        .write_stdin("hi")
        .assert()
        .success();

    // Only preview lines; the announcement must not appear.
    clipchain_cmd()
        .args(["log", "show", "--tag", "preview", "-t"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("In:"))
        .stdout(predicate::str::contains("▶").not());
}

#[test]
fn test_log_rejects_unknown_tag() {
    let dir = setup_folder();
    isolate_database(&dir);

    clipchain_cmd()
        .args(["log", "show", "--tag", "bogus", "-t"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}
