//! Checks for regressions in the command line interface
//!
//! To skip unit tests, and only run integration tests, execute:
//!
//! ```sh
//! cargo test --test integration
//! ```

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{io::Write, path::PathBuf, process::Command};
use tempfile::NamedTempFile;

const ROOT_DIR: &str = env!("CARGO_MANIFEST_DIR");

fn fixture(name: &str) -> PathBuf {
    [ROOT_DIR, "tests", "fixtures", name].iter().collect()
}

fn decafc() -> Command {
    let mut cmd = Command::main_binary().unwrap();
    cmd.env("TERM", "dumb").args(&["--color", "never"]);
    cmd
}

fn source_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

#[test]
fn valid_program_is_accepted() {
    decafc()
        .arg(fixture("valid.decaf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Compilation finished successfully"));
}

#[test]
fn check_is_the_default() {
    decafc()
        .arg("--check")
        .arg(fixture("semantic_errors.decaf"))
        .assert()
        .code(1);
    decafc()
        .arg(fixture("semantic_errors.decaf"))
        .assert()
        .code(1);
}

#[test]
fn semantic_errors_are_reported_with_location() {
    decafc()
        .arg(fixture("semantic_errors.decaf"))
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("error at (3,15): undeclared variable 'x'")
                .and(predicate::str::contains(
                    "error at (4,9): incompatible operands: int = bool",
                ))
                .and(predicate::str::contains("Compilation aborted due to 2 errors")),
        );
}

#[test]
fn json_messages() {
    let assertion = decafc()
        .args(&["--message-format", "json"])
        .arg(fixture("semantic_errors.decaf"))
        .assert()
        .code(1)
        .stderr(predicate::str::is_empty());

    let stdout = String::from_utf8_lossy(&assertion.get_output().stdout).into_owned();
    let messages: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);

    assert_eq!(messages[0]["level"], "error");
    assert_eq!(messages[0]["kind"], "UndeclaredVariable");
    assert_eq!(messages[0]["message"], "undeclared variable 'x'");
    assert_eq!(messages[0]["line"], 3);
    assert_eq!(messages[0]["column"], 15);
    assert_eq!(messages[1]["kind"], "IncompatibleBinaryOperands");
}

#[test]
fn json_for_valid_program_is_empty() {
    decafc()
        .args(&["--message-format", "json"])
        .arg(fixture("valid.decaf"))
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn inheritance_cycle_is_reported_once() {
    decafc()
        .arg(fixture("inheritance_cycle.decaf"))
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("illegal class inheritance (should be acyclic)")
                .and(predicate::str::contains("Compilation aborted due to an error"))
                .and(predicate::str::contains("caused by").not()),
        );
}

#[test]
fn lexical_errors_abort() {
    decafc()
        .arg(fixture("lexical_error.decaf"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "error at (3,17): integer literal 4294967296 is too large",
        ));
}

#[test]
fn syntax_errors_abort() {
    decafc()
        .arg(fixture("syntax_error.decaf"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error at (3,18): expected"));
}

#[test]
fn parsetest_skips_semantic_analysis() {
    decafc()
        .arg("--parsetest")
        .arg(fixture("semantic_errors.decaf"))
        .assert()
        .success();
    decafc()
        .arg("--parsetest")
        .arg(fixture("syntax_error.decaf"))
        .assert()
        .code(1);
}

#[test]
fn lextest_prints_one_token_per_line() {
    let file = source_file("class Main { } // comment\n");
    decafc()
        .arg("--lextest")
        .arg(file.path())
        .assert()
        .success()
        .stdout("class\nidentifier Main\n{\n}\nEOF\n");
}

#[test]
fn phases_are_exclusive() {
    decafc()
        .args(&["--lextest", "--check"])
        .arg(fixture("valid.decaf"))
        .assert()
        .failure();
}

#[test]
fn empty_file_has_no_main_class() {
    let file = source_file("");
    decafc()
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "error: no legal Main class named 'Main' was found",
        ));
}

#[test]
fn missing_input_file() {
    decafc()
        .arg(fixture("does_not_exist.decaf"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: cannot open input file"));
}

#[test]
fn unknown_message_format() {
    decafc()
        .args(&["--message-format", "xml"])
        .arg(fixture("valid.decaf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown message format 'xml'"));
}
