use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_every_subcommand() {
    let mut cmd = Command::cargo_bin("morpho").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("apply"))
                .and(predicate::str::contains("chain"))
                .and(predicate::str::contains("search")),
        );
}

#[test]
fn version_matches_the_crate() {
    let mut cmd = Command::cargo_bin("morpho").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn apply_against_an_empty_catalog_reports_not_found() {
    let workspace = tempfile::tempdir().unwrap();
    let config = workspace.path().join("morpho.toml");
    std::fs::write(
        &config,
        format!(
            "[storage]\nbuiltin_root = \"{}\"\nuser_root = \"{}\"\n",
            workspace.path().join("builtin").display(),
            workspace.path().join("user").display()
        ),
    )
    .unwrap();
    let input = workspace.path().join("doc.mdl");
    std::fs::write(&input, "{\"schema\": \"Class\", \"roots\": []}").unwrap();

    let mut cmd = Command::cargo_bin("morpho").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("apply")
        .arg("Ghost")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
