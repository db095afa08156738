//! CLI end-to-end tests against the shared fixture files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../tests/fixtures");

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("structassert").expect("binary should exist")
}

fn fixture(name: &str) -> String {
    format!("{FIXTURES_DIR}/{name}")
}

#[test]
fn test_e2e_order_rules() {
    cmd()
        .args(["json-type", &fixture("orders.json"), &fixture("order_rules.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn test_e2e_fixture_contains_itself() {
    cmd()
        .args(["contains", &fixture("orders.json"), &fixture("orders.json")])
        .assert()
        .success();
}

#[test]
fn test_e2e_xml_checks() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.xml");
    fs::write(&template, "<entry><author><email/></author></entry>").unwrap();

    cmd()
        .args(["xml-structure", &fixture("feed.xml")])
        .args(["--xpath", "//entry[@id='r1']", "--xpath", "count(//tag) = 2"])
        .args(["--template", template.to_str().unwrap()])
        .assert()
        .success();

    cmd()
        .args(["xml-structure", &fixture("feed.xml")])
        .args(["--xpath", "//entry/summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matched nothing"));
}

#[test]
fn test_e2e_xml_element_lookup() {
    let output = cmd()
        .args(["xml-structure", &fixture("feed.xml")])
        .args(["--element", "entry.stable > title", "--format", "compact"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let found: serde_json::Value = serde_json::from_slice(&output).expect("output should be JSON");
    assert_eq!(found["name"], serde_json::json!("title"));
    assert_eq!(found["text"], serde_json::json!("1.0.0"));
}

#[test]
fn test_e2e_xpath_over_json() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("skus.json");

    cmd()
        .args(["xpath", &fixture("orders.json"), "//orders/items/sku"])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();

    let content = fs::read_to_string(&output).expect("output file should exist");
    let skus: serde_json::Value = serde_json::from_str(&content).expect("output should be JSON");
    assert_eq!(skus, serde_json::json!(["A-1", "B-7", "C-3"]));
}

#[test]
fn test_e2e_to_xml() {
    cmd()
        .args(["to-xml", &fixture("orders.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<root>"))
        .stdout(predicate::str::contains("<sku>C-3</sku>"));
}
