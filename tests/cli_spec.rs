use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_environment_flags() {
    Command::cargo_bin("hasura-testbed")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--postgres-image"))
        .stdout(predicate::str::contains("--migrations-dir"))
        .stdout(predicate::str::contains("--app-dir"))
        .stdout(predicate::str::contains("--hasura-attempts"));
}

#[test]
fn version_flag_prints_version() {
    Command::cargo_bin("hasura-testbed")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_is_rejected() {
    Command::cargo_bin("hasura-testbed")
        .unwrap()
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
