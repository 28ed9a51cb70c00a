//! Black-box CLI tests for argument validation and usage paths that don't
//! require a live database: clap's own required-argument enforcement, and
//! `plan`'s conflicting-output-target check (which runs before any
//! connection is attempted).

use assert_cmd::Command;
use predicates::str::contains;

fn pgschema() -> Command {
    Command::cargo_bin("pgschema").expect("binary builds")
}

#[test]
fn help_lists_all_three_subcommands() {
    pgschema()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("dump"))
        .stdout(contains("plan"))
        .stdout(contains("apply"));
}

#[test]
fn missing_required_db_name_fails_with_usage_error() {
    pgschema()
        .args(["dump", "--user", "postgres"])
        .assert()
        .failure()
        .stderr(contains("--db"));
}

#[test]
fn plan_rejects_two_stdout_targets_without_connecting() {
    pgschema()
        .args([
            "plan",
            "--db",
            "scratch",
            "--user",
            "postgres",
            "--file",
            "/nonexistent/desired.sql",
            "--output-sql",
            "stdout",
            "--output-human",
            "stdout",
        ])
        .assert()
        .code(1)
        .stderr(contains("at most one"));
}
