use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn check_config_prints_derived_values() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("check-config")
        .arg(fixture("fixtures/zone_settings.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("intrazone: ok zone=intra legacy_zones=2"))
        .stdout(predicate::str::contains(
            "eastwest: ok trust_zone=trust zone=eastwest trust_subnets=10.1.1.0/24 single_ip_mode=false",
        ))
        .stdout(predicate::str::contains(
            "clone_suffix=-cloned on_malformed=abort-batch",
        ));
}

#[test]
fn check_config_accepts_one_configured_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("settings.toml");
    fs::write(
        &settings,
        "[intrazone]\nzone = \"intra\"\n\n[intrazone.legacy_zones]\ntrust = \"addr-trust\"\n",
    )
    .expect("write settings");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("check-config")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("intrazone: ok"))
        .stdout(predicate::str::contains(
            "eastwest: invalid settings: eastwest.trust_zone must be set",
        ));
}

#[test]
fn check_config_fails_when_nothing_is_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "clone_suffix = \"-ew\"\n").expect("write settings");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("check-config")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not fully configure either migration"));
}

#[test]
fn check_config_rejects_unknown_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "[eastwest]\ntrust_zones = \"trust\"\n").expect("write settings");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("check-config")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse settings file"));
}
