//! Command-line tests over plain-text documents.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const LABEL: &str = "Ship to:\nJohn Doe\n123 Main St\nOrder ID: 987-654\nPhone: 555-123-4567\nSeller Name: Acme Co\nSKU: ABC-123.4";

fn shipdoc(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shipdoc").unwrap();
    // Keep any user configuration out of the way
    cmd.env("XDG_CONFIG_HOME", config_dir).env("HOME", config_dir);
    cmd
}

#[test]
fn extract_writes_csv_table() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), LABEL).unwrap();
    fs::write(dir.path().join("b.txt"), "nothing to see").unwrap();
    let output = dir.path().join("extracted_data.csv");

    shipdoc(dir.path())
        .arg("extract")
        .arg(dir.path().join("a.txt"))
        .arg(dir.path().join("b.txt"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("2 extracted, 0 failed"));

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "Ship To,Order ID,Phone,Seller Name,SKU,File Name\n\
         \"John Doe, 123 Main St\",987-654,555-123-4567,Acme Co,ABC-123.4,a.txt\n\
         ,,,,,b.txt\n"
    );
}

#[test]
fn extract_skips_unreadable_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.txt"), LABEL).unwrap();
    fs::write(dir.path().join("broken.pdf"), "not really a pdf").unwrap();

    let assert = shipdoc(dir.path())
        .arg("extract")
        .arg(dir.path().join("broken.pdf"))
        .arg(dir.path().join("good.txt"))
        .args(["-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("good.txt"))
        .stdout(predicate::str::contains("broken.pdf").not())
        .stderr(predicate::str::contains("Error reading broken.pdf"));

    // One warning while running plus one line in the summary, no log line
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert_eq!(stderr.matches("broken.pdf").count(), 2);
    assert!(!stderr.contains("Skipping"));
}

#[test]
fn extract_strict_fails_after_writing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.txt"), LABEL).unwrap();
    fs::write(dir.path().join("broken.pdf"), "not really a pdf").unwrap();
    let output = dir.path().join("out.csv");

    shipdoc(dir.path())
        .arg("extract")
        .arg(dir.path().join("good.txt"))
        .arg(dir.path().join("broken.pdf"))
        .arg("-o")
        .arg(&output)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 documents could not be read"));

    assert!(fs::read_to_string(&output).unwrap().contains("good.txt"));
}

#[test]
fn extract_json_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), LABEL).unwrap();

    let assert = shipdoc(dir.path())
        .arg("extract")
        .arg(dir.path().join("*.txt"))
        .args(["-o", "-", "-f", "json"])
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["rule_table"], "shipping-label");
    assert_eq!(report["columns"][5], "File Name");
    assert_eq!(report["records"][0]["values"]["order_id"], "987-654");
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn extract_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();

    shipdoc(dir.path())
        .arg("extract")
        .arg(dir.path().join("*.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn extract_enforces_max_documents() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..3 {
        fs::write(dir.path().join(format!("{}.txt", i)), LABEL).unwrap();
    }
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"batch": {"max_documents": 2}}"#).unwrap();

    shipdoc(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(dir.path())
        .args(["-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most 2"));
}

#[test]
fn parse_prints_record() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("label.txt");
    fs::write(&input, LABEL).unwrap();

    shipdoc(dir.path())
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("File: label.txt"))
        .stdout(predicate::str::contains("Ship To      John Doe, 123 Main St"));
}

#[test]
fn parse_with_custom_rules() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("slip.txt");
    fs::write(&input, "Ref No: 4471\nSKU: X-1").unwrap();
    let rules = dir.path().join("rules.json");
    fs::write(
        &rules,
        r#"{"name": "refs", "version": "1", "fields": [
            {"field": "order_id", "matchers": [
                {"labels": ["Ref No"], "capture": {"kind": "token", "class": "0-9"}}
            ]}
        ]}"#,
    )
    .unwrap();

    shipdoc(dir.path())
        .arg("parse")
        .arg(&input)
        .arg("--rules")
        .arg(&rules)
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"order_id\": \"4471\""))
        .stdout(predicate::str::contains("\"sku\": \"\""));
}

#[test]
fn rules_check_reports_summary() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    fs::write(
        &rules,
        r#"{"name": "sku-only", "version": "3", "fields": [
            {"field": "sku", "matchers": [{"labels": ["SKU"], "capture": {"kind": "rest_of_line"}}]}
        ]}"#,
    )
    .unwrap();

    shipdoc(dir.path())
        .args(["rules", "check"])
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("sku-only (v3): 1 fields, 1 matchers"))
        .stdout(predicate::str::contains("no rule for Phone"));
}

#[test]
fn rules_show_builtin_json() {
    let dir = tempfile::tempdir().unwrap();

    shipdoc(dir.path())
        .args(["rules", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"shipping-label\""));
}
