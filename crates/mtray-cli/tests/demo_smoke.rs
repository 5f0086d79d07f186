use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_demo_runs_to_completion() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("mtray")
        .env("MTRAY_HOME", home.path())
        .args(["--no-animations", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chat"))
        .stdout(predicate::str::contains("Idioteque"))
        .stdout(predicate::str::contains("After clear:"));
}

#[test]
fn test_demo_escalation_puts_chat_urgent_on_top() {
    let home = tempfile::tempdir().unwrap();
    let assert = cargo_bin_cmd!("mtray")
        .env("MTRAY_HOME", home.path())
        .args(["--no-animations", "demo"])
        .assert()
        .success();

    // Both chat notifications end up urgent; the escalated one (robin) was
    // re-slotted to the front of the urgent block.
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let robin = stdout.find("robin").unwrap();
    let sam = stdout.find("sam").unwrap();
    assert!(robin < sam);
}
