//! End-to-end tests of the command-line driver.

use assert_cmd::Command;
use predicates::prelude::*;

/// A command isolated from the developer's real configuration: HOME points
/// at a fresh directory and the working directory is inside it.
fn tglng(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tglng").unwrap();
    cmd.env("HOME", home.path()).current_dir(home.path());
    cmd
}

fn home() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn literal_text_passes_through() {
    let home = home();
    tglng(&home)
        .write_stdin("Hello, world")
        .assert()
        .success()
        .stdout("Hello, world");
}

#[test]
fn commands_evaluate() {
    let home = home();
    tglng(&home)
        .write_stdin("`num-add(1, 2)")
        .assert()
        .success()
        .stdout("3");
}

#[test]
fn help_exits_zero() {
    let home = home();
    tglng(&home).arg("--help").assert().code(0);
}

#[test]
fn unknown_flag_is_incorrect_usage() {
    let home = home();
    tglng(&home).arg("--definitely-not-a-flag").assert().code(254);
}

#[test]
fn parse_error_in_input_exits_2() {
    let home = home();
    tglng(&home).write_stdin("a`(b").assert().code(2);
}

#[test]
fn execution_error_in_input_exits_4() {
    let home = home();
    tglng(&home).write_stdin("`num-div(1, 0)").assert().code(4);
}

#[test]
fn dry_run_parses_without_output() {
    let home = home();
    tglng(&home)
        .arg("--dry-run")
        .write_stdin("`num-div(1, 0)")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn dry_run_still_reports_parse_errors() {
    let home = home();
    tglng(&home)
        .arg("--dry-run")
        .write_stdin("`(unclosed")
        .assert()
        .code(2);
}

#[test]
fn locate_parse_error_prints_offset() {
    let home = home();
    tglng(&home)
        .args(["--locate-parse-error"])
        .write_stdin("abc`(def")
        .assert()
        .code(2)
        .stdout(predicate::str::is_match(r"^\d+\n$").unwrap());
}

#[test]
fn register_preset() {
    let home = home();
    tglng(&home)
        .args(["-D", "x=preset value"])
        .write_stdin("`#x#")
        .assert()
        .success()
        .stdout("preset value");
}

#[test]
fn malformed_register_preset_is_usage_error() {
    let home = home();
    tglng(&home).args(["-D", "x"]).assert().code(254);
}

#[test]
fn script_files_are_the_primary_input() {
    let home = home();
    std::fs::write(home.path().join("one.tgl"), "one-").unwrap();
    std::fs::write(home.path().join("two.tgl"), "two").unwrap();
    tglng(&home)
        .args(["-e", "one.tgl", "-e", "two.tgl"])
        .assert()
        .success()
        .stdout("one-two");
}

#[test]
fn missing_script_file_is_a_platform_error() {
    let home = home();
    tglng(&home).args(["-e", "missing.tgl"]).assert().code(5);
}

#[test]
fn output_file_receives_the_result() {
    let home = home();
    let out = home.path().join("result.txt");
    tglng(&home)
        .args(["--no-chdir", "-f"])
        .arg(&out)
        .write_stdin("payload")
        .assert()
        .success()
        .stdout("");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "payload");
}

#[test]
fn user_config_defines_commands() {
    let home = home();
    let config = home.path().join("lib.tgl");
    std::fs::write(&config, "defun hi#()[hello]").unwrap();
    tglng(&home)
        .args(["-c"])
        .arg(&config)
        .write_stdin("`hi()!")
        .assert()
        .success()
        .stdout("hello!");
}

#[test]
fn broken_user_config_exits_1() {
    let home = home();
    let config = home.path().join("lib.tgl");
    std::fs::write(&config, "defun broken#( 1").unwrap();
    tglng(&home)
        .args(["-c"])
        .arg(&config)
        .write_stdin("x")
        .assert()
        .code(1);
}

#[test]
fn default_user_config_is_read_from_home() {
    let home = home();
    std::fs::write(home.path().join(".tglng"), "defun hi#()[from-home]").unwrap();
    tglng(&home)
        .write_stdin("`hi()")
        .assert()
        .success()
        .stdout("from-home");
}

#[test]
fn unpermitted_directory_config_warns_and_is_recorded() {
    let home = home();
    let project = home.path().join("project");
    std::fs::create_dir(&project).unwrap();
    std::fs::write(project.join(".tglng"), "defun nope#()[never]").unwrap();
    let mut cmd = Command::cargo_bin("tglng").unwrap();
    cmd.env("HOME", home.path())
        .current_dir(&project)
        .write_stdin("x")
        .assert()
        .success()
        .stdout("x")
        .stderr(predicate::str::contains("not marked as permitted"));
    let known = std::fs::read_to_string(home.path().join(".tglng_known")).unwrap();
    assert!(known.contains("project"));
}

#[test]
fn permitted_directory_config_runs() {
    let home = home();
    let project = home.path().join("project");
    std::fs::create_dir(&project).unwrap();
    std::fs::write(project.join(".tglng"), "defun mark#()[local]").unwrap();
    std::fs::write(
        home.path().join(".tglng_permitted"),
        format!("{}\n", project.display()),
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("tglng").unwrap();
    cmd.env("HOME", home.path())
        .current_dir(&project)
        .write_stdin("`mark()")
        .assert()
        .success()
        .stdout("local");
}
