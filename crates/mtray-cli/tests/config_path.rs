use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_config_path_honors_mtray_home() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("mtray")
        .env("MTRAY_HOME", home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(home.path().to_str().unwrap()));
}

#[test]
fn test_config_init_creates_and_then_reports_existing() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("mtray")
        .env("MTRAY_HOME", home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert!(home.path().join("config.toml").exists());

    cargo_bin_cmd!("mtray")
        .env("MTRAY_HOME", home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
