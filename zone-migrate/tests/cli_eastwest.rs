use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use panos_xml::parse_file;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use zone_migrate::ingest::rules_from_document;
use zone_migrate::model::SecurityRule;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn read_rules(path: &Path) -> Vec<SecurityRule> {
    let root = parse_file(path).expect("output parses");
    rules_from_document(&root)
        .expect("output has rules")
        .into_iter()
        .map(|record| record.expect("well-formed rule"))
        .collect()
}

fn eastwest(settings: &Path, out: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("eastwest")
        .arg(fixture("fixtures/security-rules.xml"))
        .arg("--config")
        .arg(settings)
        .arg("--objects")
        .arg(fixture("fixtures/objects.xml"))
        .arg("--output")
        .arg(out);
    cmd
}

#[test]
fn eastwest_inserts_clones_before_their_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("eastwest.xml");

    eastwest(&fixture("fixtures/zone_settings.toml"), &out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 9 rules"))
        .stdout(predicate::str::contains(
            "[unresolved-address-type] rule=updates subject=web-fqdn",
        ));

    let rules = read_rules(&out);
    let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "allow-web-cloned",
            "allow-web",
            "app-server-cloned",
            "app-server",
            "dmz-out",
            "partner",
            "updates",
            "guest-to-trust-cloned",
            "guest-to-trust",
        ]
    );

    assert_eq!(rules[0].from_zones.as_slice(), ["dmz", "eastwest"]);
    assert_eq!(rules[0].sources.as_slice(), ["any"]);
    assert_eq!(rules[1].from_zones.as_slice(), ["trust", "dmz"]);

    assert_eq!(rules[2].from_zones.as_slice(), ["eastwest"]);
    assert_eq!(rules[2].sources.as_slice(), ["host-app"]);
    assert_eq!(rules[3].from_zones.as_slice(), ["trust"]);

    let guest_clone = &rules[7];
    assert_eq!(guest_clone.from_zones.as_slice(), ["guest"]);
    assert_eq!(guest_clone.to_zones.as_slice(), ["eastwest"]);
    assert_eq!(guest_clone.destinations.as_slice(), ["app-servers"]);
    assert_eq!(guest_clone.passthrough, rules[8].passthrough);
}

#[test]
fn eastwest_single_ip_mode_skips_any_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("single.toml");
    let base = fs::read_to_string(fixture("fixtures/zone_settings.toml")).expect("settings");
    fs::write(&settings, base.replace("10.1.1.0/24", "10.1.1.5/32")).expect("write settings");
    let out = dir.path().join("eastwest.xml");

    eastwest(&settings, &out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 8 rules"));

    let rules = read_rules(&out);
    let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    assert!(!names.contains(&"allow-web-cloned"));
    assert!(names.contains(&"app-server-cloned"));
    assert!(names.contains(&"guest-to-trust-cloned"));
}

#[test]
fn eastwest_json_report_lists_added_clones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("eastwest.xml");

    let assert = eastwest(&fixture("fixtures/zone_settings.toml"), &out)
        .arg("--format")
        .arg("json")
        .arg("--changes")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    let changes = report["changes"].as_array().expect("changes");
    let added: Vec<&str> = changes
        .iter()
        .filter(|c| c["type"] == "added")
        .filter_map(|c| c["rule"].as_str())
        .collect();
    assert_eq!(
        added,
        ["allow-web-cloned", "app-server-cloned", "guest-to-trust-cloned"]
    );
    assert!(changes
        .iter()
        .filter(|c| c["type"] != "added")
        .all(|c| c["type"] == "unchanged"));
}

#[test]
fn eastwest_requires_objects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("eastwest.xml");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zone-migrate"));
    cmd.arg("eastwest")
        .arg(fixture("fixtures/security-rules.xml"))
        .arg("--config")
        .arg(fixture("fixtures/zone_settings.toml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--objects"));
}

#[test]
fn eastwest_rejects_settings_without_subnets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = dir.path().join("settings.toml");
    let base = fs::read_to_string(fixture("fixtures/zone_settings.toml")).expect("settings");
    fs::write(
        &settings,
        base.replace("trust_subnets = [\"10.1.1.0/24\"]", "trust_subnets = []"),
    )
    .expect("write settings");
    let out = dir.path().join("eastwest.xml");

    eastwest(&settings, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("eastwest.trust_subnets"));
}
