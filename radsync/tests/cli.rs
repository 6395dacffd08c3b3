use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_sync_subcommand() {
    let mut cmd = Command::cargo_bin("radsync").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_requires_a_config_argument() {
    let mut cmd = Command::cargo_bin("radsync").expect("Binary exists");
    cmd.arg("sync");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn sync_fails_for_a_missing_config_file() {
    let mut cmd = Command::cargo_bin("radsync").expect("Binary exists");
    cmd.arg("sync").arg("--config").arg("does-not-exist.yaml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config file"));
}
